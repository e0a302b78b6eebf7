use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use service_bootstrap::config::{ConfigStore, load_file};
use tempfile::TempDir;

const CONFIG: &str = r#"
[app]
port = 8080
app_name = "os-proxy"
app_url = "http://localhost:8080"

[log]

[redis]
host = "127.0.0.1"
port = 6379

[local]
enabled = false
"#;

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[test]
fn test_file_edit_is_picked_up_by_watcher() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    write(&path, CONFIG);

    let store = ConfigStore::new(&path);
    let live = store.get(None).unwrap();
    assert_eq!(live.snapshot().app.port, 8080);

    // 감시 등록 직후 이벤트 유실 방지
    thread::sleep(Duration::from_millis(200));
    write(&path, &CONFIG.replace("port = 8080", "port = 9090"));

    assert!(wait_until(Duration::from_secs(10), || live.snapshot().app.port == 9090));
    assert_eq!(store.load_count(), 1);
    assert!(store.reload_count() >= 1);
}

#[test]
fn test_malformed_edit_keeps_last_valid_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    write(&path, CONFIG);

    let store = ConfigStore::new(&path);
    let live = store.get(None).unwrap();
    thread::sleep(Duration::from_millis(200));

    write(&path, "[app\nport = ");
    thread::sleep(Duration::from_millis(500));
    assert!(store.reload().is_err());
    assert_eq!(live.snapshot().app.port, 8080);
    assert!(!live.snapshot().local.enabled);

    write(&path, &CONFIG.replace("enabled = false", "enabled = true"));
    assert!(wait_until(Duration::from_secs(10), || live.snapshot().local.enabled));
}

#[test]
fn test_load_file_reports_path_on_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = load_file(&missing).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
