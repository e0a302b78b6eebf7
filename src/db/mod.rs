//! Database Connection Management Module
//!
//! `[[database]]` 목록의 각 항목을 이름별 핸들로 만들어 보관하는 DB 플러그인입니다.
//! 하나의 프로세스가 역할이나 테넌트별로 여러 DB에 동시에 연결할 수 있습니다.
//!
//! | driver | 핸들 | 헬스 체크 |
//! |--------|------|-----------|
//! | `mysql` | `sqlx::MySqlPool` | `SELECT 1` |
//! | `postgres` | `sqlx::PgPool` | `SELECT 1` |
//! | `mongodb` | `mongodb::Database` | `{ ping: 1 }` |
//!
//! # 기본 사용법
//!
//! ```rust,ignore
//! let db = Arc::new(DatabasePlugin::new(config.clone(), router.clone()));
//! registry.register(db.clone());
//! registry.start_all().await?;
//!
//! let DbHandle::Postgres(pool) = db.use_db("primary").await? else { ... };
//! ```
//!
//! # SQL 로그
//!
//! `enable_lg_log = true`인 항목은 sqlx 쿼리 로그(`sqlx::query` 타겟)를 남깁니다.
//! `enable_file_log_writer`이면 `{log.root_dir}/{log_filename}`, 아니면 stdout으로 갑니다.
//! 타겟 하나를 모든 풀이 공유하므로 여러 항목이 서로 다른 파일을 지정하면 마지막 항목이 적용됩니다.

pub mod driver;
pub mod schema;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use mongodb::bson::doc;
use sqlx::{MySqlPool, PgPool};
use thiserror::Error;
use crate::config::{DatabaseConfig, LiveConfig};
use crate::core::errors::{ErrorContext, PluginError, PluginResult};
use crate::core::latch::{AsyncLatch, LatchError};
use crate::core::plugin::{HealthSeverity, Instance, Plugin};
use crate::domain::entities::{EntitySchema, ENTITIES};
use crate::logging::{LogRouter, Sink};
pub use driver::DriverKind;

/// 레지스트리 키
pub const IDENTITY: &str = "DB";

/// sqlx가 쿼리 로그를 남기는 타겟
pub const SQL_LOG_TARGET: &str = "sqlx::query";

/// 드라이버 에러
#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

#[derive(Clone, Debug)]
pub struct MongoHandle {
    pub client: mongodb::Client,
    pub database: mongodb::Database,
}

/// 이름 하나에 대응하는 DB 핸들
///
/// 풀/클라이언트는 내부적으로 공유되므로 복제 비용이 작습니다.
#[derive(Clone, Debug)]
pub enum DbHandle {
    MySql(MySqlPool),
    Postgres(PgPool),
    Mongo(MongoHandle),
}

impl DbHandle {
    pub fn kind(&self) -> DriverKind {
        match self {
            DbHandle::MySql(_) => DriverKind::MySql,
            DbHandle::Postgres(_) => DriverKind::Postgres,
            DbHandle::Mongo(_) => DriverKind::Mongo,
        }
    }

    /// 가벼운 생존 확인
    pub async fn ping(&self) -> Result<(), DbError> {
        match self {
            DbHandle::MySql(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DbHandle::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DbHandle::Mongo(mongo) => {
                mongo.database.run_command(doc! { "ping": 1 }).await?;
            }
        }
        Ok(())
    }

    /// 엔티티 테이블(컬렉션)이 없으면 만듭니다.
    pub async fn create_table(&self, entity: &EntitySchema, charset: &str) -> Result<(), DbError> {
        match self {
            DbHandle::MySql(pool) => {
                if let Some(sql) = schema::create_table_sql(entity, DriverKind::MySql, charset) {
                    sqlx::query(&sql).execute(pool).await?;
                }
            }
            DbHandle::Postgres(pool) => {
                if let Some(sql) = schema::create_table_sql(entity, DriverKind::Postgres, charset) {
                    sqlx::query(&sql).execute(pool).await?;
                }
            }
            DbHandle::Mongo(mongo) => {
                let existing = mongo.database.list_collection_names().await?;
                if !existing.iter().any(|name| name == entity.table) {
                    mongo.database.create_collection(entity.table).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DbHandle::MySql(pool) => pool.close().await,
            DbHandle::Postgres(pool) => pool.close().await,
            DbHandle::Mongo(mongo) => mongo.client.clone().shutdown().await,
        }
    }
}

struct DbEntry {
    handle: DbHandle,
    severity: HealthSeverity,
}

/// DB 이름 → 핸들
///
/// 생성 시점의 설정으로 한 번 만들어지며 이후 변경되지 않습니다.
pub struct DatabaseMap {
    entries: HashMap<String, DbEntry>,
}

impl DatabaseMap {
    pub fn get(&self, name: &str) -> Option<&DbHandle> {
        self.entries.get(name).map(|e| &e.handle)
    }

    /// 이름 목록 (정렬)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn close_all(&self) {
        for (name, entry) in &self.entries {
            entry.handle.close().await;
            debug!("{} {} closed", IDENTITY, name);
        }
    }
}

/// 멀티 DB 플러그인
pub struct DatabasePlugin {
    config: Arc<LiveConfig>,
    router: Arc<LogRouter>,
    databases: AsyncLatch<Arc<DatabaseMap>>,
}

impl DatabasePlugin {
    pub fn new(config: Arc<LiveConfig>, router: Arc<LogRouter>) -> Self {
        Self {
            config,
            router,
            databases: AsyncLatch::new(),
        }
    }

    /// 설정된 이름의 핸들을 반환합니다. 아직 만들어지지 않았으면 먼저 생성합니다.
    ///
    /// 설정에 없는 이름은 [`PluginError::UnknownDatabase`]입니다.
    pub async fn use_db(&self, name: &str) -> PluginResult<DbHandle> {
        let databases = self.databases().await?;
        databases
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::UnknownDatabase(name.to_string()))
    }

    async fn databases(&self) -> PluginResult<Arc<DatabaseMap>> {
        self.databases
            .get_or_try_init(|| self.build())
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

    async fn build(&self) -> PluginResult<Arc<DatabaseMap>> {
        let conf = self.config.snapshot();
        self.install_sql_route(&conf.database)?;

        let mut map = DatabaseMap {
            entries: HashMap::new(),
        };
        for db in &conf.database {
            let handle = match self.open(db, &conf.app.app_name).await {
                Ok(handle) => handle,
                Err(e) => {
                    map.close_all().await;
                    return Err(e);
                }
            };
            info!("✅ {} {} connected ({})", IDENTITY, db.db_name, handle.kind().as_str());
            map.entries.insert(
                db.db_name.clone(),
                DbEntry {
                    handle,
                    severity: db.health_check,
                },
            );
        }

        if map.is_empty() {
            warn!("⚠️ {} no [[database]] entries configured", IDENTITY);
        }
        Ok(Arc::new(map))
    }

    async fn open(&self, db: &DatabaseConfig, app_name: &str) -> PluginResult<DbHandle> {
        let handle = driver::open(db, app_name).await?;
        if db.auto_migrate {
            if let Err(e) = migrate(db, &handle).await {
                handle.close().await;
                return Err(e);
            }
        }
        Ok(handle)
    }

    // sqlx 쿼리 로그 출력 대상 설정
    fn install_sql_route(&self, databases: &[DatabaseConfig]) -> PluginResult<()> {
        let Some(db) = databases
            .iter()
            .filter(|d| d.enable_lg_log && DriverKind::parse(&d.driver) != DriverKind::Mongo)
            .last()
        else {
            return Ok(());
        };

        let sink = if db.enable_file_log_writer {
            self.router
                .file_sink(&db.log_filename)
                .with_plugin_context(|message| PluginError::Internal {
                    plugin: IDENTITY,
                    message: format!("open {}: {}", db.log_filename, message),
                })?
        } else {
            Sink::Stdout
        };
        self.router.add_route(SQL_LOG_TARGET, sink);
        Ok(())
    }
}

async fn migrate(db: &DatabaseConfig, handle: &DbHandle) -> PluginResult<()> {
    for entity in ENTITIES {
        handle
            .create_table(entity, &db.charset)
            .await
            .with_plugin_context(|message| PluginError::Migrate {
                plugin: IDENTITY,
                message: format!("{}.{}: {}", db.db_name, entity.table, message),
            })?;
    }
    info!("{} {} migrated {} tables", IDENTITY, db.db_name, ENTITIES.len());
    Ok(())
}

/// 이름별 헬스 체크 결과를 심각도에 따라 판정합니다.
///
/// `warn` 실패는 로그만 남기고, `fatal` 실패는 모아서 하나의 에러로 반환합니다.
fn evaluate_health<'a, I>(results: I) -> PluginResult<()>
where
    I: IntoIterator<Item = (&'a str, HealthSeverity, Result<(), DbError>)>,
{
    let mut fatal = Vec::new();
    for (name, severity, result) in results {
        match result {
            Ok(()) => debug!("{} {} healthy", IDENTITY, name),
            Err(e) if severity.is_fatal() => {
                error!("❌ {} {} health check failed: {}", IDENTITY, name, e);
                fatal.push(format!("{}: {}", name, e));
            }
            Err(e) => warn!("⚠️ {} {} health check failed: {}", IDENTITY, name, e),
        }
    }

    if fatal.is_empty() {
        Ok(())
    } else {
        fatal.sort();
        Err(PluginError::Health {
            plugin: IDENTITY,
            message: fatal.join("; "),
        })
    }
}

#[async_trait]
impl Plugin for DatabasePlugin {
    fn enabled(&self) -> bool {
        true
    }

    fn identity(&self) -> &'static str {
        IDENTITY
    }

    async fn construct(&self) -> PluginResult<Instance> {
        let databases: Arc<dyn Any + Send + Sync> = self.databases().await?;
        Ok(Some(databases))
    }

    async fn check_health(&self) -> PluginResult<()> {
        let databases = self.databases().await?;
        let checks = databases.entries.iter().map(|(name, entry)| async move {
            (name.as_str(), entry.severity, entry.handle.ping().await)
        });
        evaluate_health(join_all(checks).await)
    }

    async fn close(&self) -> PluginResult<()> {
        if let Some(databases) = self.databases.take().await {
            databases.close_all().await;
        }
        Ok(())
    }
}
