//! Driver row to [`SqlValue`] conversion.
//!
//! This is the single place where driver-native values are inspected.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies a column's reported type name into a logical
//!    category (PostgreSQL and MySQL), or the value's runtime storage class is
//!    read directly (SQLite, whose columns are dynamically typed)
//! 2. Database-specific decoders extract the value for that category
//!
//! A decoder that cannot handle a value falls back to text and finally to
//! raw bytes, so conversion itself never fails.

use crate::models::{DatabaseType, SqlValue};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    UnsignedInteger,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();
    let base = lower.split('(').next().unwrap_or_default().trim();

    match base {
        "bool" | "boolean" => TypeCategory::Boolean,
        "int2" | "int4" | "int8" | "smallint" | "integer" | "int" | "bigint" | "tinyint"
        | "mediumint" | "serial" | "bigserial" | "smallserial" | "year" => TypeCategory::Integer,
        "tinyint unsigned" | "smallint unsigned" | "mediumint unsigned" | "int unsigned"
        | "bigint unsigned" | "bit" => TypeCategory::UnsignedInteger,
        "float4" | "float8" | "real" | "float" | "double" | "double precision" => {
            TypeCategory::Float
        }
        // SQLite's NUMERIC is an affinity, not an exact type
        "numeric" if db == DatabaseType::SQLite => TypeCategory::Float,
        "numeric" | "decimal" => TypeCategory::Decimal,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "bytea" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            TypeCategory::Binary
        }
        "date" => TypeCategory::Date,
        "time" => TypeCategory::Time,
        "timestamp" if db == DatabaseType::MySQL => TypeCategory::TimestampTz,
        "timestamp" | "datetime" => TypeCategory::Timestamp,
        "timestamptz" => TypeCategory::TimestampTz,
        "text" | "varchar" | "char" | "bpchar" | "name" | "citext" | "character varying"
        | "character" | "tinytext" | "mediumtext" | "longtext" | "enum" | "set" => {
            TypeCategory::Text
        }
        _ => TypeCategory::Unknown,
    }
}

// =============================================================================
// Row to Values Trait
// =============================================================================

/// Trait for converting database rows into ordered cell values.
pub trait RowToValues {
    fn column_names(&self) -> Vec<String>;
    fn to_values(&self) -> Vec<SqlValue>;
}

impl RowToValues for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), DatabaseType::MySQL);
                mysql::decode_column(self, idx, category)
            })
            .collect()
    }
}

impl RowToValues for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), DatabaseType::PostgreSQL);
                postgres::decode_column(self, idx, category)
            })
            .collect()
    }
}

impl RowToValues for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| sqlite::decode_column(self, idx, col.type_info().name()))
            .collect()
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

fn float_value(v: f64) -> SqlValue {
    SqlValue::Float(v)
}

/// Unsigned integers above `i64::MAX` keep their exact digits as a decimal.
fn unsigned_value(v: u64) -> SqlValue {
    i64::try_from(v)
        .map(SqlValue::Int)
        .unwrap_or_else(|_| SqlValue::Decimal(v.to_string()))
}

/// Last-resort decoding shared by the server drivers: checked text, then
/// unchecked text, then raw bytes.
macro_rules! decode_fallback {
    ($row:expr, $idx:expr) => {{
        if let Ok(v) = $row.try_get::<String, _>($idx) {
            SqlValue::Text(v)
        } else if let Ok(v) = $row.try_get_unchecked::<String, _>($idx) {
            SqlValue::Text(v)
        } else if let Ok(v) = $row.try_get_unchecked::<Vec<u8>, _>($idx) {
            SqlValue::Binary(v)
        } else {
            tracing::warn!(column = $idx, "Failed to decode column value");
            SqlValue::Null
        }
    }};
}

/// Null check shared by all drivers.
macro_rules! is_null_at {
    ($row:expr, $idx:expr) => {
        $row.try_get_raw($idx).map(|v| v.is_null()).unwrap_or(true)
    };
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;
    use sqlx::types::BigDecimal;
    use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> SqlValue {
        if is_null_at!(row, idx) {
            return SqlValue::Null;
        }
        let decoded = match category {
            TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(SqlValue::Bool),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::UnsignedInteger => row.try_get::<u64, _>(idx).ok().map(unsigned_value),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Decimal => row
                .try_get::<BigDecimal, _>(idx)
                .ok()
                .map(|v| SqlValue::Decimal(v.to_string())),
            TypeCategory::Json => row
                .try_get::<serde_json::Value, _>(idx)
                .ok()
                .map(SqlValue::Json),
            TypeCategory::Binary => row.try_get::<Vec<u8>, _>(idx).ok().map(SqlValue::Binary),
            TypeCategory::Date => row.try_get::<NaiveDate, _>(idx).ok().map(SqlValue::Date),
            TypeCategory::Time => row.try_get::<NaiveTime, _>(idx).ok().map(SqlValue::Time),
            TypeCategory::Timestamp => row
                .try_get::<NaiveDateTime, _>(idx)
                .ok()
                .map(SqlValue::Timestamp),
            TypeCategory::TimestampTz => row
                .try_get::<DateTime<Utc>, _>(idx)
                .ok()
                .map(SqlValue::TimestampTz),
            TypeCategory::Text | TypeCategory::Uuid | TypeCategory::Unknown => None,
        };
        decoded.unwrap_or_else(|| decode_fallback!(row, idx))
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(SqlValue::Int(v));
        }
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return Some(SqlValue::Int(v.into()));
        }
        if let Ok(v) = row.try_get::<i16, _>(idx) {
            return Some(SqlValue::Int(v.into()));
        }
        if let Ok(v) = row.try_get::<i8, _>(idx) {
            return Some(SqlValue::Int(v.into()));
        }
        // YEAR is reported unsigned
        row.try_get::<u16, _>(idx)
            .ok()
            .map(|v| SqlValue::Int(v.into()))
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(float_value(v));
        }
        row.try_get::<f32, _>(idx)
            .ok()
            .map(|v| float_value(v.into()))
    }
}

mod postgres {
    use super::*;
    use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use sqlx::types::{BigDecimal, Uuid};

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> SqlValue {
        if is_null_at!(row, idx) {
            return SqlValue::Null;
        }
        let decoded = match category {
            TypeCategory::Boolean => row.try_get::<bool, _>(idx).ok().map(SqlValue::Bool),
            TypeCategory::Integer | TypeCategory::UnsignedInteger => decode_integer(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Decimal => row
                .try_get::<BigDecimal, _>(idx)
                .ok()
                .map(|v| SqlValue::Decimal(v.to_string())),
            TypeCategory::Json => row
                .try_get::<serde_json::Value, _>(idx)
                .ok()
                .map(SqlValue::Json),
            TypeCategory::Uuid => row
                .try_get::<Uuid, _>(idx)
                .ok()
                .map(|v| SqlValue::Text(v.to_string())),
            TypeCategory::Binary => row.try_get::<Vec<u8>, _>(idx).ok().map(SqlValue::Binary),
            TypeCategory::Date => row.try_get::<NaiveDate, _>(idx).ok().map(SqlValue::Date),
            TypeCategory::Time => row.try_get::<NaiveTime, _>(idx).ok().map(SqlValue::Time),
            TypeCategory::Timestamp => row
                .try_get::<NaiveDateTime, _>(idx)
                .ok()
                .map(SqlValue::Timestamp),
            TypeCategory::TimestampTz => row
                .try_get::<DateTime<Utc>, _>(idx)
                .ok()
                .map(SqlValue::TimestampTz),
            TypeCategory::Text | TypeCategory::Unknown => None,
        };
        decoded.unwrap_or_else(|| decode_fallback!(row, idx))
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(SqlValue::Int(v));
        }
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return Some(SqlValue::Int(v.into()));
        }
        row.try_get::<i16, _>(idx)
            .ok()
            .map(|v| SqlValue::Int(v.into()))
    }

    fn decode_float(row: &PgRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(float_value(v));
        }
        row.try_get::<f32, _>(idx)
            .ok()
            .map(|v| float_value(v.into()))
    }
}

mod sqlite {
    use super::*;

    /// SQLite values carry their own storage class regardless of the
    /// declared column type; only a declared BOOLEAN changes the mapping.
    pub fn decode_column(row: &SqliteRow, idx: usize, declared_type: &str) -> SqlValue {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return SqlValue::Null,
            Ok(raw) => raw.type_info().name().to_string(),
            Err(_) => return SqlValue::Null,
        };

        let decoded = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(idx).ok().map(|v| {
                if declared_type.eq_ignore_ascii_case("boolean") {
                    SqlValue::Bool(v != 0)
                } else {
                    SqlValue::Int(v)
                }
            }),
            "REAL" => row.try_get_unchecked::<f64, _>(idx).ok().map(float_value),
            "TEXT" => row
                .try_get_unchecked::<String, _>(idx)
                .ok()
                .map(SqlValue::Text),
            "BLOB" => row
                .try_get_unchecked::<Vec<u8>, _>(idx)
                .ok()
                .map(SqlValue::Binary),
            _ => None,
        };

        decoded.unwrap_or_else(|| {
            row.try_get_unchecked::<String, _>(idx)
                .map(SqlValue::Text)
                .unwrap_or(SqlValue::Null)
        })
    }
}
