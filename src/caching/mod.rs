//! # 캐시 플러그인
//!
//! `[redis]` 설정으로 [`RedisClient`]를 한 번 만들고 생명주기를 관리합니다.
//!
//! ## 모듈 구성
//!
//! - [`redis`] - JSON 기반 get/set/del 클라이언트
//! - [`hook`] - 명령 전후 훅과 추적 래퍼
//!
//! ## 헬스 체크
//!
//! `PING` 실패는 기본적으로 치명적입니다 (`health_check = "fatal"`).
//! `"warn"`으로 설정하면 경고 로그만 남기고 시작을 계속합니다.

pub mod hook;
pub mod redis;

use std::any::Any;
use std::sync::Arc;
use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::RedisError;
use log::{error, warn};
use crate::config::{LiveConfig, RedisConfig};
use crate::core::errors::{ErrorContext, PluginError, PluginResult};
use crate::core::latch::{AsyncLatch, LatchError};
use crate::core::plugin::{HealthSeverity, Instance, Plugin};
pub use self::hook::{CommandHook, CommandLogHook, TracedConnection};
pub use self::redis::RedisClient;

/// 레지스트리 키
pub const IDENTITY: &str = "Redis";

/// `redis://[:password@]host:port/db`
pub fn redis_url(conf: &RedisConfig) -> String {
    match conf.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => format!(
            "redis://:{}@{}:{}/{}",
            urlencoding::encode(password),
            conf.host,
            conf.port,
            conf.db
        ),
        None => format!("redis://{}:{}/{}", conf.host, conf.port, conf.db),
    }
}

/// Redis 캐시 플러그인
pub struct CachePlugin {
    config: Arc<LiveConfig>,
    hooks: Vec<Arc<dyn CommandHook>>,
    client: AsyncLatch<RedisClient>,
}

impl CachePlugin {
    /// 기본 [`CommandLogHook`]이 등록된 플러그인을 만듭니다.
    pub fn new(config: Arc<LiveConfig>) -> Self {
        Self {
            config,
            hooks: vec![Arc::new(CommandLogHook)],
            client: AsyncLatch::new(),
        }
    }

    /// 명령 훅을 추가합니다. 클라이언트가 만들어지기 전에 등록해야 적용됩니다.
    pub fn with_hook(mut self, hook: Arc<dyn CommandHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// 생성된 클라이언트를 반환합니다. 아직 없으면 지금 만듭니다.
    pub async fn client(&self) -> PluginResult<RedisClient> {
        self.client
            .get_or_try_init(|| self.connect())
            .await
            .map_err(|e| match e {
                LatchError::Init(e) => e,
                LatchError::Failed(message) => PluginError::InitFailed {
                    plugin: IDENTITY,
                    message,
                },
                LatchError::Closed => PluginError::Closed(IDENTITY),
            })
    }

    async fn connect(&self) -> PluginResult<RedisClient> {
        let conf = self.config.snapshot();
        let client = ::redis::Client::open(redis_url(&conf.redis)).plugin_context(IDENTITY)?;
        let manager = ConnectionManager::new(client).await.plugin_context(IDENTITY)?;

        Ok(RedisClient::new(TracedConnection::new(manager, self.hooks.clone())))
    }
}

fn health_outcome(severity: HealthSeverity, result: Result<(), RedisError>) -> PluginResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if severity.is_fatal() => {
            error!("❌ {} PING failed: {}", IDENTITY, e);
            Err(PluginError::Health {
                plugin: IDENTITY,
                message: e.to_string(),
            })
        }
        Err(e) => {
            warn!("⚠️ {} PING failed: {}", IDENTITY, e);
            Ok(())
        }
    }
}

#[async_trait]
impl Plugin for CachePlugin {
    fn enabled(&self) -> bool {
        true
    }

    fn identity(&self) -> &'static str {
        IDENTITY
    }

    async fn construct(&self) -> PluginResult<Instance> {
        let client: Arc<dyn Any + Send + Sync> = Arc::new(self.client().await?);
        Ok(Some(client))
    }

    async fn check_health(&self) -> PluginResult<()> {
        let client = self.client().await?;
        let severity = self.config.snapshot().redis.health_check;
        health_outcome(severity, client.ping().await)
    }

    async fn close(&self) -> PluginResult<()> {
        // ConnectionManager는 마지막 복제본이 drop될 때 연결을 닫음
        self.client.take().await;
        Ok(())
    }
}
