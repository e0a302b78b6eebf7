//! # Core Framework Module
//!
//! 서브시스템 생명주기를 위한 핵심 구성 요소를 제공하는 모듈입니다.
//!
//! ## 모듈 구성
//!
//! ### [`plugin`] - 생명주기 계약
//! - **Plugin**: `enabled` / `identity` / `construct` / `check_health` / `close`
//! - **HealthSeverity**: 헬스 체크 실패를 치명적으로 볼지 경고로 볼지 결정
//!
//! ### [`registry`] - 플러그인 레지스트리
//! - 명시적으로 구성되는 순서 있는 목록 (정적 초기화 순서에 의존하지 않음)
//! - 시작 시 생성 → 헬스 체크, 종료 시 해제를 일괄 수행
//! - 플러그인별 상태와 타임스탬프
//!
//! ### [`latch`] - 1회성 초기화
//! - 동기/비동기 두 가지 래치
//! - 동시 호출자는 승자의 결과를 기다림, 실패는 재시도하지 않음
//!
//! ### [`errors`] - 통합 에러 처리
//! - **ConfigError / PluginError / BootstrapError**: `thiserror` 기반 에러 분류
//! - **ErrorContext**: 외부 라이브러리 에러에 플러그인 이름을 붙이는 확장 trait
//!
//! ## 새로운 서브시스템 추가
//!
//! 1. 어댑터 구조체 정의 + [`Plugin`](plugin::Plugin) 구현
//! 2. 외부 리소스는 [`AsyncLatch`](latch::AsyncLatch)에 보관
//! 3. 구성 루트(`plugins::builtin`)에서 `registry.register()`로 등록

pub mod errors;
pub mod latch;
pub mod plugin;
pub mod registry;

pub use errors::*;
pub use latch::{AsyncLatch, Latch, LatchError, LatchState};
pub use plugin::{HealthSeverity, Instance, Plugin};
pub use registry::*;
