//! # Configuration Module
//!
//! 프로세스 설정을 로딩하고 실행 중 파일 변경을 반영하는 모듈입니다.
//!
//! ## 모듈 구성
//!
//! - [`schema`] - `[app]`, `[log]`, `[[database]]`, `[redis]`, `[local]` 섹션 구조체와 검증 규칙
//! - [`store`] - 1회성 로딩, 핫 리로드, 라이브 설정 공유
//!
//! ## 설계 원칙
//!
//! ### 1. 실패는 시작 시점에
//!
//! 최초 로딩에서 파일이 없거나 파싱/검증에 실패하면 프로세스가 시작하지 않습니다.
//! 기본값으로 대충 채운 설정은 허용하지 않습니다.
//!
//! ### 2. 실행 중에는 멈추지 않기
//!
//! 파일을 잘못 수정해도 에러 로그만 남기고 마지막으로 유효했던 설정을 계속 사용합니다.
//!
//! ### 3. 단일 인스턴스
//!
//! 설정 인스턴스는 프로세스당 하나이며, 리로드는 필드 단위 수정이 아니라 스냅샷 교체입니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use service_bootstrap::config::ConfigStore;
//!
//! let store = ConfigStore::default();
//! let live = store.get(None)?;             // conf/config.toml
//! let port = live.snapshot().app.port;
//! ```

pub mod schema;
pub mod store;

pub use schema::*;
pub use store::{load_file, ConfigStore, LiveConfig, DEFAULT_CONFIG_PATH};
