//! 부트스트랩 전역 에러 시스템
//!
//! 설정 로딩, 플러그인 생명주기, 프로세스 부트스트랩 단계에서 발생하는
//! 에러를 `thiserror` 기반 열거형으로 정의합니다.
//!
//! ## 에러 분류
//!
//! | 분류 | 타입 | 처리 방식 |
//! |------|------|-----------|
//! | 치명적 시작 에러 | [`ConfigError`], [`BootstrapError`] | 프로세스 종료 (exit 1) |
//! | 복구 가능한 런타임 에러 | 핫 리로드 실패, 단일 DB 헬스 체크 실패 | 로그만 남기고 계속 |
//! | 종료 중 에러 | `close()` 실패 | 로그만 남기고 나머지 플러그인 계속 종료 |
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::core::errors::{ErrorContext, PluginResult};
//!
//! async fn ping(conn: &mut Connection) -> PluginResult<()> {
//!     redis::cmd("PING")
//!         .query_async::<()>(conn)
//!         .await
//!         .plugin_context("Redis")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 설정 파일 로딩/검증 에러
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 설정 파일을 읽을 수 없음 (존재하지 않거나 권한 없음)
    #[error("read config failed: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 문법 또는 타입 불일치
    #[error("config parse failed: {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 의미 검증 실패 (포트 범위, 커넥션 풀 한도, 중복 DB 이름 등)
    #[error("config validation failed: {0}")]
    Validation(String),

    /// 파일 변경 감시 등록 실패
    #[error("config watch failed: {0}")]
    Watch(String),

    /// 최초 로딩이 이미 실패한 상태에서 다시 요청됨
    #[error("config load previously failed: {0}")]
    PreviouslyFailed(String),
}

/// 플러그인 생명주기 에러
#[derive(Error, Debug, Clone)]
pub enum PluginError {
    /// 외부 리소스 연결 실패
    #[error("{plugin} connect failed: {message}")]
    Connect { plugin: &'static str, message: String },

    /// 헬스 체크 실패
    #[error("{plugin} health check failed: {message}")]
    Health { plugin: &'static str, message: String },

    /// 스키마 자동 생성 실패
    #[error("{plugin} migrate failed: {message}")]
    Migrate { plugin: &'static str, message: String },

    /// 리소스 해제 실패
    #[error("{plugin} close failed: {message}")]
    Close { plugin: &'static str, message: String },

    /// 설정되지 않은 DB 이름으로 조회
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    /// 이전 초기화가 실패하여 재시도하지 않음
    #[error("{plugin} initialization previously failed: {message}")]
    InitFailed { plugin: &'static str, message: String },

    /// 이미 종료된 플러그인에 접근
    #[error("{0} is closed")]
    Closed(&'static str),

    /// 기타 내부 에러
    #[error("{plugin}: {message}")]
    Internal { plugin: &'static str, message: String },
}

/// 프로세스 부트스트랩 단계 에러
///
/// `main`이 이 에러를 받으면 원인을 로그로 남기고 0이 아닌 종료 코드로 종료합니다.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 특정 플러그인의 construct/check_health 실패
    #[error("plugin {identity} failed to start: {source}")]
    Plugin {
        identity: &'static str,
        #[source]
        source: PluginError,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// 편의성을 위한 Result 타입 별칭
pub type PluginResult<T> = Result<T, PluginError>;

/// 외부 라이브러리 에러를 PluginError로 변환하는 확장 trait
///
/// sqlx, redis, mongodb 등의 에러에 플러그인 이름을 붙여
/// 어느 서브시스템에서 실패했는지 드러나게 합니다.
pub trait ErrorContext<T> {
    /// 연결 단계 에러로 변환합니다.
    fn plugin_context(self, plugin: &'static str) -> PluginResult<T>;

    /// 클로저로 에러 종류를 직접 선택합니다.
    fn with_plugin_context<F>(self, f: F) -> PluginResult<T>
    where
        F: FnOnce(String) -> PluginError;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn plugin_context(self, plugin: &'static str) -> PluginResult<T> {
        self.map_err(|e| PluginError::Connect {
            plugin,
            message: e.to_string(),
        })
    }

    fn with_plugin_context<F>(self, f: F) -> PluginResult<T>
    where
        F: FnOnce(String) -> PluginError,
    {
        self.map_err(|e| f(e.to_string()))
    }
}
