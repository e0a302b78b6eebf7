//! 자동 스키마 생성 대상 엔티티
//!
//! DB 플러그인은 `auto_migrate = true`일 때 [`ENTITIES`]의 각 스키마로 테이블(또는 컬렉션)을
//! 만듭니다. 플러그인은 스키마의 컬럼 정의만 읽으며 엔티티 구조체 자체에는 관여하지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 논리 컬럼 타입. 실제 SQL 타입은 드라이버별로 결정됩니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    /// 자동 증가 기본 키
    Id,
    BigInt,
    Integer,
    VarChar(u16),
    Text,
    Bool,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty, nullable: false }
}

const fn nullable(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty, nullable: true }
}

/// 테이블 하나의 스키마
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySchema {
    pub table: &'static str,
    pub columns: &'static [Column],
}

/// 스키마를 가진 엔티티
pub trait Entity {
    const SCHEMA: EntitySchema;
}

/// 저장된 객체의 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDataInfo {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub storage_name: String,
    pub address: String,
    pub md5: String,
    pub size: i64,
    pub content_type: String,
    pub multi_part: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MetaDataInfo {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "meta_data_info",
        columns: &[
            col("id", ColumnType::Id),
            col("uid", ColumnType::VarChar(64)),
            col("name", ColumnType::VarChar(255)),
            col("storage_name", ColumnType::VarChar(255)),
            col("address", ColumnType::VarChar(512)),
            col("md5", ColumnType::VarChar(64)),
            col("size", ColumnType::BigInt),
            col("content_type", ColumnType::VarChar(128)),
            col("multi_part", ColumnType::Bool),
            col("created_at", ColumnType::Timestamp),
            col("updated_at", ColumnType::Timestamp),
        ],
    };
}

/// 멀티파트 업로드 조각 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiPartInfo {
    pub id: i64,
    pub storage_uid: String,
    pub chunk_num: i32,
    pub bucket: String,
    pub storage_name: String,
    pub storage_size: i64,
    pub part_file_name: String,
    pub part_md5: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for MultiPartInfo {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "multi_part_info",
        columns: &[
            col("id", ColumnType::Id),
            col("storage_uid", ColumnType::VarChar(64)),
            col("chunk_num", ColumnType::Integer),
            col("bucket", ColumnType::VarChar(255)),
            col("storage_name", ColumnType::VarChar(255)),
            col("storage_size", ColumnType::BigInt),
            col("part_file_name", ColumnType::VarChar(255)),
            col("part_md5", ColumnType::VarChar(64)),
            col("status", ColumnType::Integer),
            col("created_at", ColumnType::Timestamp),
        ],
    };
}

/// 비동기 작업
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: i64,
    pub task_type: String,
    pub status: i32,
    pub ext: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for TaskInfo {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "task_info",
        columns: &[
            col("id", ColumnType::Id),
            col("task_type", ColumnType::VarChar(64)),
            col("status", ColumnType::Integer),
            nullable("ext", ColumnType::Text),
            col("retry_count", ColumnType::Integer),
            col("created_at", ColumnType::Timestamp),
            col("updated_at", ColumnType::Timestamp),
        ],
    };
}

/// 작업 실행 로그
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLog {
    pub id: i64,
    pub task_id: i64,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for TaskLog {
    const SCHEMA: EntitySchema = EntitySchema {
        table: "task_log",
        columns: &[
            col("id", ColumnType::Id),
            col("task_id", ColumnType::BigInt),
            nullable("content", ColumnType::Text),
            col("created_at", ColumnType::Timestamp),
        ],
    };
}

/// 자동 생성 대상 엔티티 목록 (생성 순서)
pub const ENTITIES: &[EntitySchema] = &[
    MetaDataInfo::SCHEMA,
    MultiPartInfo::SCHEMA,
    TaskInfo::SCHEMA,
    TaskLog::SCHEMA,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entity_has_id_primary_key_first() {
        for schema in ENTITIES {
            assert_eq!(schema.columns[0].ty, ColumnType::Id, "{}", schema.table);
        }
    }

    #[test]
    fn test_table_names_are_unique() {
        let mut tables: Vec<_> = ENTITIES.iter().map(|s| s.table).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), ENTITIES.len());
    }
}
