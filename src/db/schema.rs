//! 엔티티 스키마 → 드라이버별 DDL

use crate::db::driver::DriverKind;
use crate::domain::entities::{Column, ColumnType, EntitySchema};

/// `CREATE TABLE IF NOT EXISTS` 문을 생성합니다.
///
/// MongoDB는 스키마가 없으므로 `None`을 반환합니다.
pub fn create_table_sql(schema: &EntitySchema, kind: DriverKind, charset: &str) -> Option<String> {
    let columns: Vec<String> = match kind {
        DriverKind::MySql => schema.columns.iter().map(mysql_column).collect(),
        DriverKind::Postgres => schema.columns.iter().map(postgres_column).collect(),
        DriverKind::Mongo => return None,
    };

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.table,
        columns.join(", ")
    );
    if kind == DriverKind::MySql {
        sql.push_str(&format!(" ENGINE=InnoDB DEFAULT CHARSET={}", charset));
    }
    Some(sql)
}

fn mysql_column(column: &Column) -> String {
    let ty = match column.ty {
        ColumnType::Id => return format!("{} BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY", column.name),
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Integer => "INT".to_string(),
        ColumnType::VarChar(len) => format!("VARCHAR({})", len),
        ColumnType::Text => "LONGTEXT".to_string(),
        ColumnType::Bool => "TINYINT(1)".to_string(),
        ColumnType::Timestamp => "DATETIME(3)".to_string(),
    };
    with_null(column, ty)
}

fn postgres_column(column: &Column) -> String {
    let ty = match column.ty {
        ColumnType::Id => return format!("{} BIGSERIAL PRIMARY KEY", column.name),
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::VarChar(len) => format!("VARCHAR({})", len),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::Bool => "BOOLEAN".to_string(),
        ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
    };
    with_null(column, ty)
}

fn with_null(column: &Column, ty: String) -> String {
    if column.nullable {
        format!("{} {} NULL", column.name, ty)
    } else {
        format!("{} {} NOT NULL", column.name, ty)
    }
}
