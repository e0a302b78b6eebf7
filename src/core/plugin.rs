//! 플러그인 생명주기 계약
//!
//! DB, Redis, Local 등 모든 선택적 서브시스템이 구현하는 공통 인터페이스입니다.
//! [`PluginRegistry`](crate::core::registry::PluginRegistry)는 이 trait만 보고
//! 생성, 헬스 체크, 종료를 순서대로 진행합니다.

use std::any::Any;
use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::errors::PluginResult;

/// `construct()`가 돌려주는 인스턴스
///
/// 리소스가 없는 플러그인(Local)은 `None`을 반환합니다.
pub type Instance = Option<Arc<dyn Any + Send + Sync>>;

/// 외부 서브시스템 생명주기 인터페이스
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 현재 설정 기준으로 이 플러그인을 사용할지 여부
    fn enabled(&self) -> bool;

    /// 레지스트리 키이자 로그 라벨 (예: "DB", "Redis", "Local")
    fn identity(&self) -> &'static str;

    /// 외부 리소스를 1회 생성합니다.
    ///
    /// 두 번째 호출부터는 부수 효과 없이 이미 만들어진 인스턴스를 반환해야 합니다.
    async fn construct(&self) -> PluginResult<Instance>;

    /// 생성된 리소스에 가벼운 생존 확인을 수행합니다.
    async fn check_health(&self) -> PluginResult<()>;

    /// 리소스를 해제합니다. 생성된 적이 없으면 아무것도 하지 않습니다.
    async fn close(&self) -> PluginResult<()>;
}

/// 헬스 체크 실패의 심각도
///
/// `Fatal`이면 실패가 시작 절차를 중단시키고, `Warn`이면 로그만 남깁니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthSeverity {
    #[default]
    Fatal,
    Warn,
}

impl HealthSeverity {
    pub fn is_fatal(self) -> bool {
        matches!(self, HealthSeverity::Fatal)
    }
}
