//! # Plugin Registry - 서브시스템 생명주기 관리
//!
//! 프로세스가 사용하는 고정된 서브시스템 집합(DB, Redis, Local ...)을 등록 순서대로
//! 보관하고, 시작 시 생성 → 헬스 체크, 종료 시 해제를 일괄 수행합니다.
//!
//! ## 동작 방식
//!
//! ```text
//! start_all()
//!    ├─ enabled() == false  → 건너뜀 (Disabled)
//!    ├─ "starting"          → construct()
//!    ├─ "checking health"   → check_health()
//!    └─ "ready"             → Ready { since }
//!         (construct/check_health 실패 시 즉시 중단)
//!
//! stop_all()
//!    ├─ enabled() == false  → 건너뜀
//!    └─ close()             → 실패해도 로그만 남기고 다음 플러그인 계속
//! ```
//!
//! ## 등록 규칙
//!
//! - 키는 [`Plugin::identity`]이며, 같은 키로 다시 등록하면 기존 항목을 같은 자리에서 교체합니다.
//! - 순회 순서는 등록 순서입니다. 정적 초기화 순서에 의존하지 않습니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! let mut registry = PluginRegistry::new();
//! registry.register(Arc::new(DatabasePlugin::new(config.clone(), router.clone())));
//! registry.register(Arc::new(CachePlugin::new(config.clone())));
//!
//! registry.start_all().await?;
//! // ...
//! registry.stop_all().await;
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use crate::core::errors::{BootstrapError, PluginError};
use crate::core::plugin::Plugin;

/// 플러그인별 생명주기 상태
#[derive(Debug, Clone, PartialEq)]
pub enum PluginStatus {
    /// 등록만 되고 아직 시작 절차를 거치지 않음
    Registered,
    /// 설정에서 비활성화되어 건너뜀
    Disabled,
    /// 생성 및 헬스 체크 완료
    Ready { since: DateTime<Utc> },
    /// construct 또는 check_health 실패
    Failed { reason: String },
    /// close() 완료
    Closed { at: DateTime<Utc> },
}

/// `start_all()` 결과 요약
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupReport {
    /// 생성 및 헬스 체크를 통과한 플러그인 (시작 순서)
    pub started: Vec<&'static str>,
    /// 비활성화로 건너뛴 플러그인
    pub skipped: Vec<&'static str>,
}

/// `stop_all()` 결과 요약
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub closed: Vec<&'static str>,
    pub failures: Vec<(&'static str, PluginError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Entry {
    plugin: Arc<dyn Plugin>,
    status: PluginStatus,
}

/// 서브시스템 플러그인 레지스트리
///
/// 레지스트리는 어댑터만 보관하며, 실제 리소스 핸들(커넥션 풀, 클라이언트)은
/// 각 어댑터가 소유합니다.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 플러그인을 등록합니다. 같은 identity가 있으면 조용히 교체합니다.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let identity = plugin.identity();
        let entries = self.entries.get_mut().unwrap_or_else(PoisonError::into_inner);

        let entry = Entry {
            plugin,
            status: PluginStatus::Registered,
        };
        match entries.iter().position(|e| e.plugin.identity() == identity) {
            Some(index) => entries[index] = entry,
            None => entries.push(entry),
        }
        info!("📦 Registering plugin: {}", identity);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 등록 순서대로 identity 목록을 반환합니다.
    pub fn identities(&self) -> Vec<&'static str> {
        self.lock().iter().map(|e| e.plugin.identity()).collect()
    }

    pub fn get(&self, identity: &str) -> Option<Arc<dyn Plugin>> {
        self.lock()
            .iter()
            .find(|e| e.plugin.identity() == identity)
            .map(|e| e.plugin.clone())
    }

    pub fn status(&self, identity: &str) -> Option<PluginStatus> {
        self.lock()
            .iter()
            .find(|e| e.plugin.identity() == identity)
            .map(|e| e.status.clone())
    }

    pub fn statuses(&self) -> Vec<(&'static str, PluginStatus)> {
        self.lock()
            .iter()
            .map(|e| (e.plugin.identity(), e.status.clone()))
            .collect()
    }

    /// 활성화된 모든 플러그인을 생성하고 헬스 체크합니다.
    ///
    /// 첫 번째 실패에서 즉시 중단하며, 실패한 플러그인 identity를 담은 에러를 반환합니다.
    /// 이미 시작된 플러그인은 그대로 두므로, 호출자는 이어서 `stop_all()`로 정리할 수 있습니다.
    pub async fn start_all(&self) -> Result<StartupReport, BootstrapError> {
        let mut report = StartupReport::default();

        for plugin in self.snapshot() {
            let identity = plugin.identity();
            if !plugin.enabled() {
                self.set_status(identity, PluginStatus::Disabled);
                report.skipped.push(identity);
                continue;
            }

            info!("🔄 {} starting ...", identity);
            if let Err(e) = plugin.construct().await {
                return Err(self.fail(identity, e));
            }

            info!("{} checking health ...", identity);
            if let Err(e) = plugin.check_health().await {
                return Err(self.fail(identity, e));
            }

            self.set_status(identity, PluginStatus::Ready { since: Utc::now() });
            info!("✅ {} ready", identity);
            report.started.push(identity);
        }

        Ok(report)
    }

    /// 활성화된 모든 플러그인을 닫습니다.
    ///
    /// 개별 실패는 로그로 남기고 나머지 플러그인 종료를 계속합니다.
    pub async fn stop_all(&self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for plugin in self.snapshot() {
            let identity = plugin.identity();
            if !plugin.enabled() {
                continue;
            }

            match plugin.close().await {
                Ok(()) => {
                    self.set_status(identity, PluginStatus::Closed { at: Utc::now() });
                    info!("{} closed", identity);
                    report.closed.push(identity);
                }
                Err(e) => {
                    warn!("❌ {} close failed: {}", identity, e);
                    report.failures.push((identity, e));
                }
            }
        }

        report
    }

    fn fail(&self, identity: &'static str, source: PluginError) -> BootstrapError {
        error!("❌ {} failed: {}", identity, source);
        self.set_status(
            identity,
            PluginStatus::Failed {
                reason: source.to_string(),
            },
        );
        BootstrapError::Plugin { identity, source }
    }

    // 락을 쥔 채로 await 하지 않도록 어댑터 목록을 복제해서 순회합니다.
    fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.lock().iter().map(|e| e.plugin.clone()).collect()
    }

    fn set_status(&self, identity: &str, status: PluginStatus) {
        if let Some(entry) = self
            .lock()
            .iter_mut()
            .find(|e| e.plugin.identity() == identity)
        {
            entry.status = status;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PluginResult;
    use crate::core::plugin::Instance;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        constructs: AtomicUsize,
        healths: AtomicUsize,
        closes: AtomicUsize,
        releases: AtomicUsize,
        constructed: AtomicBool,
    }

    struct FakePlugin {
        identity: &'static str,
        enabled: AtomicBool,
        fail_health: bool,
        calls: Arc<Counting>,
    }

    impl FakePlugin {
        fn new(identity: &'static str, enabled: bool) -> (Arc<Self>, Arc<Counting>) {
            let calls = Arc::new(Counting::default());
            let plugin = Arc::new(Self {
                identity,
                enabled: AtomicBool::new(enabled),
                fail_health: false,
                calls: calls.clone(),
            });
            (plugin, calls)
        }
    }

    #[async_trait]
    impl Plugin for FakePlugin {
        fn enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn identity(&self) -> &'static str {
            self.identity
        }

        async fn construct(&self) -> PluginResult<Instance> {
            self.calls.constructs.fetch_add(1, Ordering::SeqCst);
            self.calls.constructed.store(true, Ordering::SeqCst);
            Ok(None)
        }

        async fn check_health(&self) -> PluginResult<()> {
            self.calls.healths.fetch_add(1, Ordering::SeqCst);
            if self.fail_health {
                return Err(PluginError::Health {
                    plugin: self.identity,
                    message: "health check failed".to_string(),
                });
            }
            Ok(())
        }

        async fn close(&self) -> PluginResult<()> {
            self.calls.closes.fetch_add(1, Ordering::SeqCst);
            // 생성된 적이 없으면 해제할 것도 없음
            if self.calls.constructed.swap(false, Ordering::SeqCst) {
                self.calls.releases.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[test]
    fn test_register_same_identity_replaces_in_place() {
        let mut registry = PluginRegistry::new();
        let (db, _) = FakePlugin::new("DB", true);
        let (redis, _) = FakePlugin::new("Redis", true);
        let (db_again, _) = FakePlugin::new("DB", false);

        registry.register(db);
        registry.register(redis);
        registry.register(db_again);

        assert_eq!(registry.identities(), vec!["DB", "Redis"]);
        assert!(!registry.get("DB").unwrap().enabled());
    }

    #[tokio::test]
    async fn test_start_all_skips_disabled_plugins() {
        let mut registry = PluginRegistry::new();
        let (on, on_calls) = FakePlugin::new("DB", true);
        let (off, off_calls) = FakePlugin::new("Local", false);
        registry.register(on);
        registry.register(off);

        let report = registry.start_all().await.unwrap();
        assert_eq!(report.started, vec!["DB"]);
        assert_eq!(report.skipped, vec!["Local"]);

        let shutdown = registry.stop_all().await;
        assert_eq!(shutdown.closed, vec!["DB"]);

        assert_eq!(on_calls.constructs.load(Ordering::SeqCst), 1);
        assert_eq!(on_calls.healths.load(Ordering::SeqCst), 1);
        assert_eq!(on_calls.closes.load(Ordering::SeqCst), 1);
        assert_eq!(off_calls.constructs.load(Ordering::SeqCst), 0);
        assert_eq!(off_calls.healths.load(Ordering::SeqCst), 0);
        assert_eq!(off_calls.closes.load(Ordering::SeqCst), 0);
        assert_eq!(registry.status("Local"), Some(PluginStatus::Disabled));
    }

    #[tokio::test]
    async fn test_start_all_aborts_on_health_failure() {
        let mut registry = PluginRegistry::new();
        let calls = Arc::new(Counting::default());
        registry.register(Arc::new(FakePlugin {
            identity: "Redis",
            enabled: AtomicBool::new(true),
            fail_health: true,
            calls: calls.clone(),
        }));
        let (later, later_calls) = FakePlugin::new("Local", true);
        registry.register(later);

        let err = registry.start_all().await.unwrap_err();
        match err {
            BootstrapError::Plugin { identity, .. } => assert_eq!(identity, "Redis"),
            other => panic!("Expected plugin error, got {:?}", other),
        }
        assert!(matches!(
            registry.status("Redis"),
            Some(PluginStatus::Failed { .. })
        ));
        assert_eq!(later_calls.constructs.load(Ordering::SeqCst), 0);
        assert_eq!(registry.status("Local"), Some(PluginStatus::Registered));

        let shutdown = registry.stop_all().await;
        assert!(shutdown.is_clean());
        assert_eq!(shutdown.closed, vec!["Redis", "Local"]);
        assert_eq!(calls.releases.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.closes.load(Ordering::SeqCst), 1);
        assert_eq!(later_calls.releases.load(Ordering::SeqCst), 0);
        assert!(matches!(registry.status("Local"), Some(PluginStatus::Closed { .. })));
    }
}
