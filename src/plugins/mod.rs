//! 내장 플러그인 구성
//!
//! 프로세스가 사용하는 서브시스템을 고정된 순서(DB → Redis → Local)로 등록합니다.

pub mod local;

use std::sync::Arc;
use crate::caching::CachePlugin;
use crate::config::LiveConfig;
use crate::core::registry::PluginRegistry;
use crate::db::DatabasePlugin;
use crate::logging::LogRouter;
pub use local::LocalPlugin;

/// 내장 어댑터가 등록된 레지스트리와 각 어댑터 핸들
pub struct Builtin {
    pub registry: PluginRegistry,
    pub database: Arc<DatabasePlugin>,
    pub cache: Arc<CachePlugin>,
}

/// DB, Redis, Local 순서로 등록합니다.
pub fn builtin(config: Arc<LiveConfig>, router: Arc<LogRouter>) -> Builtin {
    let database = Arc::new(DatabasePlugin::new(config.clone(), router));
    let cache = Arc::new(CachePlugin::new(config.clone()));

    let mut registry = PluginRegistry::new();
    registry.register(database.clone());
    registry.register(cache.clone());
    registry.register(Arc::new(LocalPlugin::new(config)));

    Builtin {
        registry,
        database,
        cache,
    }
}
