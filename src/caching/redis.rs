//! # Redis 캐시 클라이언트 구현
//!
//! `ConnectionManager`(자동 재연결, 멀티플렉싱) 위에 명령 훅 래퍼를 얹은 클라이언트입니다.
//! 값은 JSON 문자열로 직렬화해서 저장합니다.
//!
//! ## 연결 관리
//!
//! 클라이언트를 복제하면 같은 연결을 공유합니다. 명령마다 새 연결을 열지 않습니다.

use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{AsyncCommands, ErrorKind, RedisError};
use serde::{Serialize, de::DeserializeOwned};
use crate::caching::hook::TracedConnection;

/// Redis 캐시 클라이언트 래퍼
///
/// ## 사용 예제
///
/// ```rust,ignore
/// use crate::caching::CachePlugin;
///
/// let redis = cache.client().await?;
///
/// // 1시간 TTL
/// redis.set_with_expiry("task:42", &task, 3600).await?;
/// let cached: Option<TaskInfo> = redis.get("task:42").await?;
/// ```
#[derive(Clone)]
pub struct RedisClient<C = TracedConnection<ConnectionManager>> {
    conn: C,
}

fn serialization_error(context: &'static str, e: serde_json::Error) -> RedisError {
    RedisError::from((ErrorKind::TypeError, context, e.to_string()))
}

impl<C> RedisClient<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// 연결 상태 확인 (PING)
    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await
    }

    /// 지정된 키에서 값을 조회합니다.
    ///
    /// ## 반환값
    ///
    /// - `Ok(Some(T))` - 키가 존재하고 역직렬화 성공
    /// - `Ok(None)` - 키가 존재하지 않음
    /// - `Err(RedisError)` - Redis 오류 또는 역직렬화 실패
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RedisError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(json) => {
                let deserialized = serde_json::from_str(&json)
                    .map_err(|e| serialization_error("Deserialization failed", e))?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// 지정된 키에 값을 저장합니다. 기존 값은 덮어쓰며 TTL은 없습니다.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value).map_err(|e| serialization_error("Serialization failed", e))?;
        conn.set(key, json).await
    }

    /// 만료 시간(초)과 함께 값을 저장합니다.
    pub async fn set_with_expiry<T: Serialize>(&self, key: &str, value: &T, seconds: u64) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value).map_err(|e| serialization_error("Serialization failed", e))?;
        conn.set_ex(key, json, seconds).await
    }

    /// 지정된 키를 삭제합니다. 키가 없어도 성공입니다.
    pub async fn del(&self, key: &str) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        conn.del(key).await
    }
}
