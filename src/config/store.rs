//! 설정 저장소
//!
//! 설정 파일을 프로세스당 한 번 로딩하고, 이후 파일 변경 알림이 오면
//! 같은 [`LiveConfig`] 인스턴스의 내용을 통째로 교체합니다.
//!
//! # 흐름
//! ```text
//! ConfigStore::get(path?)
//!     → Latch (최초 1회만 실행, 동시 호출자는 대기)
//!     → 경로 결정 (인자 > 기본 경로), 상대 경로는 현재 디렉토리 기준
//!     → 파일 읽기 → TOML 파싱 → validator 검증    (실패 시 치명적)
//!     → Arc<LiveConfig> 캐시
//!     → notify 감시 시작
//!
//! 파일 변경 이벤트
//!     → 다시 읽기/파싱/검증
//!     → 성공: ArcSwap으로 스냅샷 교체
//!     → 실패: 에러 로그, 이전 값 유지
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use arc_swap::ArcSwap;
use log::{error, info, warn};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use validator::Validate;
use crate::config::schema::Configuration;
use crate::core::errors::ConfigError;
use crate::core::latch::{Latch, LatchError};

/// 경로 인자가 없을 때 사용하는 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

/// 프로세스의 유일한 라이브 설정
///
/// 모든 컴포넌트가 같은 `Arc<LiveConfig>`를 공유하고, 필요할 때마다
/// [`snapshot`](Self::snapshot)으로 현재 값을 읽습니다.
/// 리로드는 전체 스냅샷을 원자적으로 교체하므로 여러 필드가 섞여 보이는 일은 없습니다.
pub struct LiveConfig {
    path: PathBuf,
    current: ArcSwap<Configuration>,
}

impl LiveConfig {
    fn new(path: PathBuf, conf: Configuration) -> Self {
        Self {
            path,
            current: ArcSwap::from_pointee(conf),
        }
    }

    /// 파일 없이 고정된 설정으로 만듭니다. 도구와 테스트에서 사용합니다.
    pub fn fixed(conf: Configuration) -> Arc<Self> {
        Arc::new(Self::new(PathBuf::new(), conf))
    }

    /// 현재 설정 스냅샷
    pub fn snapshot(&self) -> Arc<Configuration> {
        self.current.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replace(&self, conf: Configuration) {
        self.current.store(Arc::new(conf));
    }
}

/// 설정 저장소
pub struct ConfigStore {
    default_path: PathBuf,
    watch: bool,
    live: Latch<Arc<LiveConfig>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    loads: AtomicUsize,
    reloads: Arc<AtomicUsize>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            watch: true,
            live: Latch::new(),
            watcher: Mutex::new(None),
            loads: AtomicUsize::new(0),
            reloads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 파일 감시 없이 동작하는 저장소를 만듭니다.
    pub fn without_watch(mut self) -> Self {
        self.watch = false;
        self
    }

    /// 라이브 설정을 반환합니다.
    ///
    /// 최초 호출에서만 파일을 읽으며, 이후에는 인자와 관계없이 캐시된 인스턴스를 돌려줍니다.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - 파일이 없거나 읽을 수 없음
    /// * `ConfigError::Parse` - TOML 문법/타입 오류
    /// * `ConfigError::Validation` - 의미 검증 실패
    /// * `ConfigError::PreviouslyFailed` - 최초 로딩이 이미 실패함
    pub fn get(&self, path: Option<&Path>) -> Result<Arc<LiveConfig>, ConfigError> {
        let result = self.live.get_or_try_init(|| {
            let path = resolve_path(path.unwrap_or(self.default_path.as_path()))?;
            info!("load config: {}", path.display());

            let conf = load_file(&path)?;
            self.loads.fetch_add(1, Ordering::SeqCst);

            let live = Arc::new(LiveConfig::new(path, conf));
            if self.watch {
                if let Err(e) = self.start_watch(&live) {
                    warn!("config hot reload disabled: {}", e);
                }
            }
            Ok::<_, ConfigError>(live)
        });

        match result {
            Ok(live) => Ok(live),
            Err(LatchError::Init(e)) => Err(e),
            Err(LatchError::Failed(message)) => Err(ConfigError::PreviouslyFailed(message)),
            Err(LatchError::Closed) => Err(ConfigError::PreviouslyFailed("store closed".to_string())),
        }
    }

    /// 감시 이벤트와 같은 절차로 즉시 다시 읽습니다.
    ///
    /// 실패하면 이전 설정이 그대로 유지되고 에러를 반환합니다.
    /// 최초 로딩 전이면 아무것도 하지 않습니다.
    pub fn reload(&self) -> Result<(), ConfigError> {
        match self.live.get() {
            Some(live) => reload_into(&live, &self.reloads),
            None => Ok(()),
        }
    }

    /// 최초 로딩 횟수 (0 또는 1)
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// 성공한 리로드 횟수
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    /// 로딩된 설정 파일 경로
    pub fn path(&self) -> Option<PathBuf> {
        self.live.get().map(|live| live.path().to_path_buf())
    }

    fn start_watch(&self, live: &Arc<LiveConfig>) -> Result<(), ConfigError> {
        let target = live.path().to_path_buf();
        let watched_dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = target.file_name().map(|n| n.to_os_string());

        let handle = live.clone();
        let reloads = self.reloads.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_config {
                        return;
                    }
                    info!("config file changed: {}", handle.path().display());
                    if let Err(e) = reload_into(&handle, &reloads) {
                        error!("config reload failed, keeping current configuration: {}", e);
                    }
                }
                Err(e) => error!("config watch error: {:?}", e),
            },
            notify::Config::default(),
        )
        .map_err(|e| ConfigError::Watch(e.to_string()))?;

        // 에디터가 파일을 교체(rename)해도 이벤트를 받도록 상위 디렉토리를 감시
        watcher
            .watch(&watched_dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Watch(e.to_string()))?;

        info!("config watcher started: {}", watched_dir.display());
        *self.watcher.lock().unwrap_or_else(PoisonError::into_inner) = Some(watcher);
        Ok(())
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

/// 파일을 읽고 파싱/검증합니다.
pub fn load_file(path: &Path) -> Result<Configuration, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &content)
}

fn parse(path: &Path, content: &str) -> Result<Configuration, ConfigError> {
    let conf: Configuration = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    conf.validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    Ok(conf)
}

fn reload_into(live: &LiveConfig, reloads: &AtomicUsize) -> Result<(), ConfigError> {
    let conf = load_file(live.path())?;
    live.replace(conf);
    reloads.fetch_add(1, Ordering::SeqCst);
    info!("config reloaded: {}", live.path().display());
    Ok(())
}
