//! 설정 파일 스키마
//!
//! `conf/config.toml`의 각 섹션에 대응하는 구조체입니다.
//! 문법 검증은 serde/toml이, 의미 검증(포트 범위, 풀 한도, 중복 DB 이름)은 `validator`가 담당합니다.
//!
//! ```toml
//! [app]
//! env = "dev"
//! port = 8080
//! app_name = "os-proxy"
//! app_url = "http://localhost:8080"
//!
//! [log]
//! level = "info"
//! root_dir = "./storage/logs"
//! filename = "app.log"
//! enable_file = true
//!
//! [[database]]
//! driver = "postgres"
//! db_name = "primary"
//! host = "127.0.0.1"
//! port = 5432
//! database = "proxy"
//! username = "proxy"
//! password = "secret"
//!
//! [redis]
//! host = "127.0.0.1"
//! port = 6379
//! db = 0
//!
//! [local]
//! enabled = false
//! ```

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::core::plugin::HealthSeverity;

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// 문자열에서 Environment를 생성합니다. 알 수 없는 값은 `Production`입니다.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

/// 전체 설정 트리
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_unique_db_names"))]
pub struct Configuration {
    #[validate(nested)]
    pub app: AppConfig,

    #[validate(nested)]
    pub log: LogConfig,

    /// 0개 이상의 DB 연결 설정 (`[[database]]`)
    #[serde(default)]
    #[validate(nested)]
    pub database: Vec<DatabaseConfig>,

    #[validate(nested)]
    pub redis: RedisConfig,

    pub local: LocalConfig,
}

/// `[app]` 애플리케이션 식별 정보
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: String,

    #[validate(range(min = 1))]
    pub port: u16,

    #[validate(length(min = 1))]
    pub app_name: String,

    #[serde(default)]
    pub app_url: String,
}

impl AppConfig {
    pub fn environment(&self) -> Environment {
        Environment::parse(&self.env)
    }
}

fn default_env() -> String {
    "production".to_string()
}

/// `[log]` 로깅 정책
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub root_dir: String,
    #[validate(length(min = 1))]
    pub filename: String,
    /// "text" 또는 "json"
    pub format: String,
    pub show_line: bool,
    pub max_backups: usize,
    /// 로그 파일 최대 크기 (MB)
    #[validate(range(min = 1))]
    pub max_size: u64,
    /// 백업 파일 보관 기간 (일), 0이면 기간 제한 없음
    pub max_age: u64,
    pub compress: bool,
    pub enable_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            root_dir: "./storage/logs".to_string(),
            filename: "app.log".to_string(),
            format: "text".to_string(),
            show_line: true,
            max_backups: 3,
            max_size: 500,
            max_age: 28,
            compress: false,
            enable_file: false,
        }
    }
}

/// `[[database]]` 단일 DB 연결 설정
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_pool_limits"))]
pub struct DatabaseConfig {
    /// 드라이버 종류 ("mysql", "postgres", "mongodb"), 알 수 없으면 mysql
    #[serde(default = "default_driver")]
    pub driver: String,

    /// 멀티 DB 맵의 키
    #[validate(length(min = 1))]
    pub db_name: String,

    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// 실제 접속할 데이터베이스 이름
    #[validate(length(min = 1))]
    pub database: String,

    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_charset")]
    pub charset: String,

    #[serde(default = "default_max_idle")]
    pub max_idle_conns: u32,

    #[serde(default = "default_max_open")]
    pub max_open_conns: u32,

    /// SQL 로그 레벨 ("silent", "error", "warn", "info")
    #[serde(default = "default_log_mode")]
    pub log_mode: String,

    /// SQL 구문 로그 사용 여부
    #[serde(default)]
    pub enable_lg_log: bool,

    /// SQL 로그를 파일로 보낼지 여부 (false면 stdout)
    #[serde(default)]
    pub enable_file_log_writer: bool,

    #[serde(default = "default_sql_log_filename")]
    pub log_filename: String,

    /// 엔티티 테이블 자동 생성
    #[serde(default)]
    pub auto_migrate: bool,

    /// 풀만 만들고 실제 연결은 첫 사용 시점으로 미룸
    #[serde(default)]
    pub lazy_connect: bool,

    #[serde(default = "default_db_health")]
    pub health_check: HealthSeverity,
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_max_idle() -> u32 {
    10
}

fn default_max_open() -> u32 {
    100
}

fn default_log_mode() -> String {
    "info".to_string()
}

fn default_sql_log_filename() -> String {
    "sql.log".to_string()
}

fn default_db_health() -> HealthSeverity {
    HealthSeverity::Warn
}

/// `[redis]` 캐시 연결 설정
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RedisConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// 논리 DB 인덱스
    #[serde(default)]
    #[validate(range(min = 0, max = 15))]
    pub db: i64,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub health_check: HealthSeverity,
}

/// `[local]` 로컬 모드 플래그
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn validate_pool_limits(db: &DatabaseConfig) -> Result<(), ValidationError> {
    if db.max_open_conns == 0 {
        return Err(ValidationError::new("max_open_conns_zero"));
    }
    if db.max_idle_conns > db.max_open_conns {
        return Err(ValidationError::new("max_idle_exceeds_max_open"));
    }
    Ok(())
}

fn validate_unique_db_names(conf: &Configuration) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for db in &conf.database {
        if !seen.insert(db.db_name.as_str()) {
            let mut err = ValidationError::new("duplicate_db_name");
            err.add_param("db_name".into(), &db.db_name);
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"
[app]
env = "dev"
port = 8080
app_name = "os-proxy"
app_url = "http://localhost:8080"

[log]
level = "debug"
root_dir = "./storage/logs"
filename = "app.log"

[[database]]
driver = "postgres"
db_name = "primary"
host = "127.0.0.1"
port = 5432
database = "proxy"
username = "proxy"
password = "secret"

[[database]]
driver = "mysql"
db_name = "replica"
host = "127.0.0.1"
port = 3306
database = "proxy"
username = "root"
max_idle_conns = 5
max_open_conns = 20

[redis]
host = "127.0.0.1"
port = 6379
db = 2

[local]
enabled = true
"#;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse("Testing"), Environment::Test);
        assert_eq!(Environment::parse("stage"), Environment::Staging);
        assert_eq!(Environment::parse("unknown"), Environment::Production);
    }

    #[test]
    fn test_sample_parses_and_validates() {
        let conf: Configuration = toml::from_str(SAMPLE).unwrap();
        conf.validate().unwrap();

        assert_eq!(conf.app.environment(), Environment::Development);
        assert_eq!(conf.database.len(), 2);
        let db = |name: &str| conf.database.iter().find(|d| d.db_name == name).unwrap();
        assert_eq!(db("replica").max_open_conns, 20);
        assert_eq!(db("primary").charset, "utf8mb4");
        assert_eq!(db("primary").health_check, HealthSeverity::Warn);
        assert_eq!(conf.redis.health_check, HealthSeverity::Fatal);
        assert_eq!(conf.redis.db, 2);
        assert!(conf.local.enabled);
        assert_eq!(conf.log.max_backups, 3);
    }

    #[test]
    fn test_missing_required_section_is_rejected() {
        let without_redis = SAMPLE.replace("[redis]", "[cache]");
        assert!(toml::from_str::<Configuration>(&without_redis).is_err());
    }

    #[test]
    fn test_duplicate_db_names_fail_validation() {
        let dup = SAMPLE.replace("db_name = \"replica\"", "db_name = \"primary\"");
        let conf: Configuration = toml::from_str(&dup).unwrap();
        let err = conf.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate_db_name"));
    }

    #[test]
    fn test_idle_above_open_fails_validation() {
        let bad = SAMPLE.replace("max_idle_conns = 5", "max_idle_conns = 50");
        let conf: Configuration = toml::from_str(&bad).unwrap();
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_database_list_is_optional() {
        let minimal = r#"
[app]
port = 9000
app_name = "minimal"

[log]

[redis]
host = "localhost"
port = 6379

[local]
"#;
        let conf: Configuration = toml::from_str(minimal).unwrap();
        conf.validate().unwrap();
        assert!(conf.database.is_empty());
        assert!(!conf.local.enabled);
        assert_eq!(conf.app.environment(), Environment::Production);
    }
}
