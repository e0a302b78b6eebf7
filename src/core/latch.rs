//! 1회성 초기화 래치
//!
//! 외부 리소스 생성이 프로세스당 최대 한 번만 일어나도록 보장하는 상태 기계입니다.
//!
//! ```text
//! Uninitialized ──get_or_try_init──▶ Initializing ──Ok──▶ Ready(T) ──take──▶ Closed
//!                                          │
//!                                          └──Err──▶ Failed(msg)
//! ```
//!
//! - [`Latch`]: `Mutex` + `Condvar` 기반, 설정 저장소처럼 동기 코드에서 사용
//! - [`AsyncLatch`]: tokio `Mutex` 기반, 플러그인 `construct()`처럼 네트워크 I/O를 기다리는 곳에서 사용
//!
//! `Initializing` 상태에서 들어온 호출자는 승자의 초기화가 끝날 때까지 대기하고,
//! 모두 같은 결과를 관찰합니다. `Failed`/`Closed` 상태에서는 초기화 함수를 다시 실행하지 않습니다.

use std::future::Future;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// 래치 내부 상태
#[derive(Debug, Clone, PartialEq)]
pub enum LatchState<T> {
    Uninitialized,
    Initializing,
    Ready(T),
    Failed(String),
    Closed,
}

impl<T> LatchState<T> {
    /// 상태 이름 (로그용)
    pub fn label(&self) -> &'static str {
        match self {
            LatchState::Uninitialized => "uninitialized",
            LatchState::Initializing => "initializing",
            LatchState::Ready(_) => "ready",
            LatchState::Failed(_) => "failed",
            LatchState::Closed => "closed",
        }
    }
}

/// 래치 접근 실패 사유
#[derive(Debug)]
pub enum LatchError<E> {
    /// 이번 호출이 실행한 초기화 함수의 에러
    Init(E),
    /// 이전 초기화가 실패함 (메시지만 보존)
    Failed(String),
    /// 이미 `take()`로 해제됨
    Closed,
}

/// 동기 1회성 래치
pub struct Latch<T> {
    state: Mutex<LatchState<T>>,
    ready: Condvar,
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Latch<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LatchState::Uninitialized),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LatchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Latch<T> {
    /// 값이 없으면 `init`을 정확히 한 번 실행하고, 있으면 복제본을 반환합니다.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<T, LatchError<E>>
    where
        E: std::fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        let mut state = self.lock();
        loop {
            match &*state {
                LatchState::Ready(value) => return Ok(value.clone()),
                LatchState::Failed(message) => return Err(LatchError::Failed(message.clone())),
                LatchState::Closed => return Err(LatchError::Closed),
                LatchState::Initializing => {
                    state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
                LatchState::Uninitialized => break,
            }
        }
        *state = LatchState::Initializing;
        drop(state);

        // init이 패닉하더라도 대기자들이 영원히 멈추지 않도록 Failed로 전이
        let mut guard = InitGuard { latch: self, done: false };
        let result = init();
        guard.done = true;

        let mut state = self.lock();
        let outcome = match result {
            Ok(value) => {
                *state = LatchState::Ready(value.clone());
                Ok(value)
            }
            Err(e) => {
                *state = LatchState::Failed(e.to_string());
                Err(LatchError::Init(e))
            }
        };
        drop(state);
        self.ready.notify_all();
        outcome
    }

    /// `Ready`일 때만 값을 반환합니다.
    pub fn get(&self) -> Option<T> {
        match &*self.lock() {
            LatchState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn state_label(&self) -> &'static str {
        self.lock().label()
    }
}

struct InitGuard<'a, T> {
    latch: &'a Latch<T>,
    done: bool,
}

impl<T> Drop for InitGuard<'_, T> {
    fn drop(&mut self) {
        if !self.done {
            *self.latch.lock() = LatchState::Failed("initializer panicked".to_string());
            self.latch.ready.notify_all();
        }
    }
}

/// 비동기 1회성 래치
///
/// 초기화 동안 tokio `Mutex`를 쥐고 있으므로 동시에 들어온 호출자는 락을 기다립니다.
/// 초기화 future가 중간에 취소되면 상태가 `Initializing`으로 남는데,
/// 다음 호출자는 이를 버려진 초기화로 보고 다시 시도합니다.
pub struct AsyncLatch<T> {
    state: tokio::sync::Mutex<LatchState<T>>,
}

impl<T> Default for AsyncLatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncLatch<T> {
    pub fn new() -> Self {
        Self {
            state: tokio::sync::Mutex::new(LatchState::Uninitialized),
        }
    }
}

impl<T: Clone> AsyncLatch<T> {
    pub async fn get_or_try_init<E, F, Fut>(&self, init: F) -> Result<T, LatchError<E>>
    where
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut state = self.state.lock().await;
        match &*state {
            LatchState::Ready(value) => return Ok(value.clone()),
            LatchState::Failed(message) => return Err(LatchError::Failed(message.clone())),
            LatchState::Closed => return Err(LatchError::Closed),
            LatchState::Uninitialized | LatchState::Initializing => {}
        }

        *state = LatchState::Initializing;
        match init().await {
            Ok(value) => {
                *state = LatchState::Ready(value.clone());
                Ok(value)
            }
            Err(e) => {
                *state = LatchState::Failed(e.to_string());
                Err(LatchError::Init(e))
            }
        }
    }

    pub async fn get(&self) -> Option<T> {
        match &*self.state.lock().await {
            LatchState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// `Ready` 값을 꺼내고 `Closed`로 전이합니다. 다른 상태에서는 아무것도 하지 않습니다.
    pub async fn take(&self) -> Option<T> {
        let mut state = self.state.lock().await;
        if !matches!(&*state, LatchState::Ready(_)) {
            return None;
        }
        match std::mem::replace(&mut *state, LatchState::Closed) {
            LatchState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub async fn state_label(&self) -> &'static str {
        self.state.lock().await.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_latch_runs_init_once_across_threads() {
        let latch = Arc::new(Latch::<Arc<String>>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let latch = latch.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    latch
                        .get_or_try_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok::<_, String>(Arc::new("loaded".to_string()))
                        })
                        .map_err(|_| ())
                        .unwrap()
                })
            })
            .collect();

        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for value in &values {
            assert!(Arc::ptr_eq(value, &values[0]));
        }
    }

    #[test]
    fn test_latch_failure_is_sticky() {
        let latch = Latch::<u32>::new();
        let first = latch.get_or_try_init(|| Err::<u32, _>("boom"));
        assert!(matches!(first, Err(LatchError::Init("boom"))));

        let second = latch.get_or_try_init(|| Ok::<_, &str>(7));
        match second {
            Err(LatchError::Failed(message)) => assert_eq!(message, "boom"),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(latch.state_label(), "failed");
        assert_eq!(latch.get(), None);
    }

    #[test]
    fn test_latch_panicking_init_marks_failed() {
        let latch = Arc::new(Latch::<u32>::new());
        let cloned = latch.clone();
        let joined = thread::spawn(move || {
            let _ = cloned.get_or_try_init(|| -> Result<u32, String> { panic!("init blew up") });
        })
        .join();
        assert!(joined.is_err());

        let next = latch.get_or_try_init(|| Ok::<_, String>(1));
        assert!(matches!(next, Err(LatchError::Failed(_))));
    }

    #[tokio::test]
    async fn test_async_latch_idempotent_and_take() {
        let latch = AsyncLatch::<Arc<u32>>::new();
        let calls = AtomicUsize::new(0);

        let first = latch
            .get_or_try_init(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Arc::new(42))
            })
            .await
            .map_err(|_| ())
            .unwrap();
        let second = latch
            .get_or_try_init(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Arc::new(0))
            })
            .await
            .map_err(|_| ())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        assert!(latch.take().await.is_some());
        assert_eq!(latch.state_label().await, "closed");
        assert!(latch.take().await.is_none());

        let after = latch
            .get_or_try_init(|| async { Ok::<_, String>(Arc::new(1)) })
            .await;
        assert!(matches!(after, Err(LatchError::Closed)));
    }

    #[tokio::test]
    async fn test_async_latch_take_before_init_is_noop() {
        let latch = AsyncLatch::<u8>::new();
        assert!(latch.take().await.is_none());
        assert_eq!(latch.state_label().await, "uninitialized");
    }
}
