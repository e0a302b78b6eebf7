use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use service_bootstrap::core::{
    BootstrapError, Instance, Plugin, PluginError, PluginRegistry, PluginResult, PluginStatus,
};

type Journal = Arc<Mutex<Vec<String>>>;

struct Scripted {
    identity: &'static str,
    journal: Journal,
    fail_construct: bool,
    fail_close: bool,
    live: AtomicBool,
}

impl Scripted {
    fn new(identity: &'static str, journal: &Journal) -> Self {
        Self {
            identity,
            journal: journal.clone(),
            fail_construct: false,
            fail_close: false,
            live: AtomicBool::new(false),
        }
    }

    fn record(&self, step: &str) {
        self.journal.lock().unwrap().push(format!("{}:{}", self.identity, step));
    }
}

#[async_trait]
impl Plugin for Scripted {
    fn enabled(&self) -> bool {
        true
    }

    fn identity(&self) -> &'static str {
        self.identity
    }

    async fn construct(&self) -> PluginResult<Instance> {
        self.record("construct");
        if self.fail_construct {
            return Err(PluginError::Connect {
                plugin: self.identity,
                message: "connection refused".to_string(),
            });
        }
        self.live.store(true, Ordering::SeqCst);
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(self.identity.len());
        Ok(Some(instance))
    }

    async fn check_health(&self) -> PluginResult<()> {
        self.record("health");
        Ok(())
    }

    async fn close(&self) -> PluginResult<()> {
        if !self.live.swap(false, Ordering::SeqCst) {
            self.record("close-noop");
            return Ok(());
        }
        self.record("close");
        if self.fail_close {
            return Err(PluginError::Close {
                plugin: self.identity,
                message: "already gone".to_string(),
            });
        }
        Ok(())
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_lifecycle_follows_registration_order() {
    let journal = journal();
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(Scripted::new("DB", &journal)));
    registry.register(Arc::new(Scripted::new("Redis", &journal)));

    let report = registry.start_all().await.unwrap();
    registry.stop_all().await;

    assert_eq!(report.started, vec!["DB", "Redis"]);
    assert_eq!(
        *journal.lock().unwrap(),
        vec![
            "DB:construct",
            "DB:health",
            "Redis:construct",
            "Redis:health",
            "DB:close",
            "Redis:close",
        ]
    );
    assert!(matches!(registry.status("DB"), Some(PluginStatus::Closed { .. })));
}

#[tokio::test]
async fn test_construct_failure_names_the_plugin_and_stops_startup() {
    let journal = journal();
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(Scripted::new("DB", &journal)));
    registry.register(Arc::new(Scripted {
        fail_construct: true,
        ..Scripted::new("Redis", &journal)
    }));
    registry.register(Arc::new(Scripted::new("Local", &journal)));

    let err = registry.start_all().await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::Plugin {
            identity: "Redis",
            source: PluginError::Connect { .. }
        }
    ));
    assert!(err.to_string().contains("Redis"));
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["DB:construct", "DB:health", "Redis:construct"]
    );

    let statuses = registry.statuses();
    assert!(matches!(statuses[0], ("DB", PluginStatus::Ready { .. })));
    assert!(matches!(statuses[1], ("Redis", PluginStatus::Failed { .. })));
    assert_eq!(statuses[2], ("Local", PluginStatus::Registered));

    let shutdown = registry.stop_all().await;
    assert!(shutdown.is_clean());
    assert_eq!(shutdown.closed, vec!["DB", "Redis", "Local"]);
    assert!(journal.lock().unwrap().ends_with(&[
        "DB:close".to_string(),
        "Redis:close-noop".to_string(),
        "Local:close-noop".to_string(),
    ]));
    assert!(registry
        .statuses()
        .iter()
        .all(|(_, status)| matches!(status, PluginStatus::Closed { .. })));
}

#[tokio::test]
async fn test_close_failure_does_not_block_remaining_plugins() {
    let journal = journal();
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(Scripted {
        fail_close: true,
        ..Scripted::new("DB", &journal)
    }));
    registry.register(Arc::new(Scripted::new("Redis", &journal)));

    registry.start_all().await.unwrap();
    let report = registry.stop_all().await;

    assert!(!report.is_clean());
    assert_eq!(report.closed, vec!["Redis"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "DB");
    assert!(journal.lock().unwrap().ends_with(&["DB:close".to_string(), "Redis:close".to_string()]));
}

#[tokio::test]
async fn test_empty_registry_is_a_noop() {
    let registry = PluginRegistry::new();

    assert!(registry.is_empty());
    assert_eq!(registry.start_all().await.unwrap().started.len(), 0);
    assert!(registry.stop_all().await.is_clean());
}
