//! 서비스 부트스트랩 계층
//!
//! 장기 실행 서비스가 시작할 때 필요한 공통 기반을 제공합니다.
//!
//! # Features
//!
//! - **설정**: TOML 설정 1회 로딩, 검증, 파일 변경 시 핫 리로드
//! - **플러그인**: DB, Redis, Local 서브시스템의 생성 → 헬스 체크 → 종료 생명주기
//! - **멀티 DB**: 이름별 MySQL / PostgreSQL / MongoDB 핸들
//! - **로깅**: env_logger 기반 콘솔 출력 + 로테이션 파일 + SQL 로그 라우팅
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │      main       │ ← CLI, 시그널, 종료 코드
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  ConfigStore    │ ← Arc<LiveConfig> (핫 리로드)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ PluginRegistry  │ ← start_all / stop_all
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ DB, Redis, Local│ ← 어댑터
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use service_bootstrap::config::ConfigStore;
//! use service_bootstrap::{logging, plugins};
//!
//! let live = ConfigStore::default().get(None)?;
//! let router = logging::init(&live.snapshot().log)?;
//! let builtin = plugins::builtin(live.clone(), router);
//!
//! builtin.registry.start_all().await?;
//! let primary = builtin.database.use_db("primary").await?;
//! ```

pub mod core;
pub mod config;
pub mod db;
pub mod caching;
pub mod domain;
pub mod logging;
pub mod plugins;
pub mod utils;
