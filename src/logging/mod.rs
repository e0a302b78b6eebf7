//! 로깅 초기화 및 라우팅
//!
//! `env_logger`로 콘솔 필터/출력을 구성하고, 그 위에 다음 기능을 얹은 `log::Log` 구현을 설치합니다.
//!
//! - `[log] enable_file = true`이면 `{root_dir}/{filename}`에도 기록 (크기 기반 로테이션)
//! - 런타임에 타겟별 라우트를 추가하여 특정 타겟의 레코드를 별도 싱크로 보냄
//!   (DB 플러그인이 `sqlx::query` 로그를 SQL 로그 파일로 보낼 때 사용)
//! - `format = "json"`이면 한 줄에 JSON 객체 하나, `show_line`이면 `file:line` 포함
//!
//! # Environment Variables
//!
//! * `RUST_LOG` - 설정 파일의 `level`보다 우선합니다 (예: `RUST_LOG=debug`)

pub mod rotate;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use chrono::Utc;
use env_logger::Env;
use log::{LevelFilter, Log, Metadata, Record};
use serde_json::json;
use crate::config::LogConfig;
use crate::core::errors::BootstrapError;
pub use rotate::{RotatingFile, RotationPolicy};

/// 레코드 출력 형식
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 라우트 출력 대상
#[derive(Clone)]
pub enum Sink {
    Stdout,
    File(Arc<Mutex<RotatingFile>>),
}

impl Sink {
    /// `root_dir` 아래 로테이션 파일 싱크를 엽니다.
    pub fn file(root_dir: &str, filename: &str, policy: RotationPolicy) -> io::Result<Self> {
        let path = Path::new(root_dir).join(filename);
        Ok(Sink::File(Arc::new(Mutex::new(RotatingFile::open(path, policy)?))))
    }

    fn write_line(&self, line: &str) {
        // 로깅 경로에서 실패해도 애플리케이션은 계속 동작
        let _ = match self {
            Sink::Stdout => writeln!(io::stdout().lock(), "{}", line),
            Sink::File(file) => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(file, "{}", line)
            }
        };
    }
}

struct Route {
    target_prefix: String,
    sink: Sink,
}

/// 콘솔 + 파일 + 타겟 라우팅 로거
pub struct LogRouter {
    console: env_logger::Logger,
    file: Option<Sink>,
    routes: RwLock<Vec<Route>>,
    format: LogFormat,
    show_line: bool,
    root_dir: PathBuf,
    policy: RotationPolicy,
}

impl LogRouter {
    /// `[log]` 섹션으로 로거를 구성합니다. 전역 설치는 하지 않습니다.
    pub fn from_config(conf: &LogConfig) -> Result<Self, BootstrapError> {
        let format = LogFormat::parse(&conf.format);
        let show_line = conf.show_line;

        let console = env_logger::Builder::from_env(Env::default().default_filter_or(conf.level.as_str()))
            .format(move |buf, record| writeln!(buf, "{}", render(record, format, show_line)))
            .build();

        let policy = RotationPolicy::from_log_config(conf);
        let file = if conf.enable_file {
            let sink = Sink::file(&conf.root_dir, &conf.filename, policy)
                .map_err(|e| BootstrapError::Logging(format!("{}/{}: {}", conf.root_dir, conf.filename, e)))?;
            Some(sink)
        } else {
            None
        };

        Ok(Self {
            console,
            file,
            routes: RwLock::new(Vec::new()),
            format,
            show_line,
            root_dir: PathBuf::from(&conf.root_dir),
            policy,
        })
    }

    /// 타겟 접두사가 일치하는 레코드를 `sink`로 보냅니다.
    ///
    /// 같은 접두사로 다시 등록하면 기존 라우트를 교체합니다.
    pub fn add_route(&self, target_prefix: impl Into<String>, sink: Sink) {
        let target_prefix = target_prefix.into();
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.retain(|r| r.target_prefix != target_prefix);
        routes.push(Route { target_prefix, sink });
        log::set_max_level(LevelFilter::Trace);
    }

    /// 로그 루트 디렉토리 기준 로테이션 파일 싱크를 엽니다.
    pub fn file_sink(&self, filename: &str) -> io::Result<Sink> {
        let path = self.root_dir.join(filename);
        Ok(Sink::File(Arc::new(Mutex::new(RotatingFile::open(path, self.policy)?))))
    }

    fn max_level(&self) -> LevelFilter {
        let routed = !self.routes.read().unwrap_or_else(PoisonError::into_inner).is_empty();
        if routed {
            LevelFilter::Trace
        } else {
            self.console.filter()
        }
    }

    fn route_for(&self, target: &str) -> Option<Sink> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| target.starts_with(&r.target_prefix))
            .map(|r| r.sink.clone())
    }
}

impl Log for LogRouter {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.route_for(metadata.target()).is_some()
    }

    fn log(&self, record: &Record) {
        if let Some(sink) = self.route_for(record.target()) {
            sink.write_line(&render(record, self.format, self.show_line));
            return;
        }
        if !self.console.matches(record) {
            return;
        }
        self.console.log(record);
        if let Some(file) = &self.file {
            file.write_line(&render(record, self.format, self.show_line));
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(Sink::File(file)) = &self.file {
            let _ = file.lock().unwrap_or_else(PoisonError::into_inner).flush();
        }
    }
}

struct SharedLogger(Arc<LogRouter>);

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.0.log(record)
    }

    fn flush(&self) {
        self.0.flush()
    }
}

/// 로거를 구성하고 전역으로 설치합니다. 프로세스당 한 번만 호출할 수 있습니다.
pub fn init(conf: &LogConfig) -> Result<Arc<LogRouter>, BootstrapError> {
    let router = Arc::new(LogRouter::from_config(conf)?);
    log::set_boxed_logger(Box::new(SharedLogger(router.clone())))
        .map_err(|e| BootstrapError::Logging(e.to_string()))?;
    log::set_max_level(router.max_level());
    Ok(router)
}

fn render(record: &Record, format: LogFormat, show_line: bool) -> String {
    let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let location = match (show_line, record.file(), record.line()) {
        (true, Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
        _ => None,
    };

    match format {
        LogFormat::Json => {
            let mut value = json!({
                "ts": ts,
                "level": record.level().as_str(),
                "target": record.target(),
                "msg": record.args().to_string(),
            });
            if let Some(location) = location {
                value["caller"] = json!(location);
            }
            value.to_string()
        }
        LogFormat::Text => match location {
            Some(location) => format!(
                "{} {:<5} [{}] {} {}",
                ts,
                record.level(),
                record.target(),
                location,
                record.args()
            ),
            None => format!("{} {:<5} [{}] {}", ts, record.level(), record.target(), record.args()),
        },
    }
}
