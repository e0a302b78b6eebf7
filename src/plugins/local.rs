//! 로컬 모드 플래그 플러그인
//!
//! 외부 리소스가 없습니다. `[local] enabled`만 레지스트리에 노출합니다.

use async_trait::async_trait;
use std::sync::Arc;
use crate::config::LiveConfig;
use crate::core::errors::PluginResult;
use crate::core::plugin::{Instance, Plugin};

pub const IDENTITY: &str = "Local";

pub struct LocalPlugin {
    config: Arc<LiveConfig>,
}

impl LocalPlugin {
    pub fn new(config: Arc<LiveConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Plugin for LocalPlugin {
    // 리로드된 값을 매번 읽음
    fn enabled(&self) -> bool {
        self.config.snapshot().local.enabled
    }

    fn identity(&self) -> &'static str {
        IDENTITY
    }

    async fn construct(&self) -> PluginResult<Instance> {
        Ok(None)
    }

    async fn check_health(&self) -> PluginResult<()> {
        Ok(())
    }

    async fn close(&self) -> PluginResult<()> {
        Ok(())
    }
}
