//! Redis 명령 훅
//!
//! [`TracedConnection`]은 감싼 연결로 나가는 모든 명령(파이프라인 포함)의
//! 전후에 등록된 [`CommandHook`]을 호출합니다.

use std::sync::Arc;
use std::time::{Duration, Instant};
use log::debug;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{Arg, Cmd, Pipeline, RedisError, RedisFuture, Value};

/// 명령 추적 로그 타겟
pub const TRACE_TARGET: &str = "cache::trace";

/// 명령 실행 전후 콜백
pub trait CommandHook: Send + Sync {
    fn before(&self, _command: &str) {}

    fn after(&self, command: &str, elapsed: Duration, outcome: Result<(), &RedisError>);
}

/// 명령 이름, 소요 시간, 결과를 debug 레벨로 남기는 기본 훅
#[derive(Debug, Default)]
pub struct CommandLogHook;

impl CommandHook for CommandLogHook {
    fn after(&self, command: &str, elapsed: Duration, outcome: Result<(), &RedisError>) {
        match outcome {
            Ok(()) => debug!(target: TRACE_TARGET, "{} ok in {:?}", command, elapsed),
            Err(e) => debug!(target: TRACE_TARGET, "{} failed in {:?}: {}", command, elapsed, e),
        }
    }
}

/// 명령 이름 (첫 번째 인자, 대문자)
pub fn command_name(cmd: &Cmd) -> String {
    match cmd.args_iter().next() {
        Some(Arg::Simple(bytes)) => String::from_utf8_lossy(bytes).to_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

/// 훅을 거치는 연결 래퍼
#[derive(Clone)]
pub struct TracedConnection<C = ConnectionManager> {
    inner: C,
    hooks: Arc<[Arc<dyn CommandHook>]>,
}

impl<C> TracedConnection<C> {
    pub fn new(inner: C, hooks: Vec<Arc<dyn CommandHook>>) -> Self {
        Self {
            inner,
            hooks: hooks.into(),
        }
    }

    fn before(&self, command: &str) {
        for hook in self.hooks.iter() {
            hook.before(command);
        }
    }

    fn after(&self, command: &str, elapsed: Duration, outcome: Result<(), &RedisError>) {
        for hook in self.hooks.iter() {
            hook.after(command, elapsed, outcome);
        }
    }
}

impl<C: ConnectionLike + Send> ConnectionLike for TracedConnection<C> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        Box::pin(async move {
            let command = command_name(cmd);
            self.before(&command);

            let started = Instant::now();
            let result = self.inner.req_packed_command(cmd).await;
            self.after(&command, started.elapsed(), result.as_ref().map(|_| ()));
            result
        })
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        Box::pin(async move {
            self.before("PIPELINE");

            let started = Instant::now();
            let result = self.inner.req_packed_commands(cmd, offset, count).await;
            self.after("PIPELINE", started.elapsed(), result.as_ref().map(|_| ()));
            result
        })
    }

    fn get_db(&self) -> i64 {
        self.inner.get_db()
    }
}
