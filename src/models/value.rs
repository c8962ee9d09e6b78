//! The tagged cell value every driver row is converted into.
//!
//! Conversion happens once, at the driver boundary (`db::types`). Everything
//! downstream (JSON serialization, tuple rendering, the ASCII table) works on
//! [`SqlValue`] only.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single normalized cell value.
///
/// Serializes to a plain JSON scalar: binary as base64, temporal values as
/// ISO-8601 strings, decimals as exact strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal text, never rounded through a float.
    Decimal(String),
    Text(String),
    Binary(#[serde(serialize_with = "serialize_base64")] Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(JsonValue),
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Values read back from JSON lose their original tag: strings stay text,
/// numbers become `Int` when they fit, and arrays or objects become `Json`.
impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(SqlValue::from)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => SqlValue::Null,
            JsonValue::Bool(b) => SqlValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => n
                    .as_f64()
                    .map(SqlValue::Float)
                    .unwrap_or_else(|| SqlValue::Decimal(n.to_string())),
            },
            JsonValue::String(s) => SqlValue::Text(s),
            other => SqlValue::Json(other),
        }
    }
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Borrow the text of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) | SqlValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Numbers align right in tables.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlValue::Int(_) | SqlValue::Float(_) | SqlValue::Decimal(_)
        )
    }

    /// Plain rendering without quoting, used for table cells.
    pub fn to_plain_string(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(s) | SqlValue::Decimal(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Tuple-element rendering: text-like values are single-quoted, NULL is bare.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(d) => f.write_str(d),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Binary(b) => write!(f, "b'{}'", STANDARD.encode(b)),
            SqlValue::Date(d) => write!(f, "'{}'", d),
            SqlValue::Time(t) => write!(f, "'{}'", t),
            SqlValue::Timestamp(ts) => write!(f, "'{}'", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
            SqlValue::TimestampTz(ts) => write!(f, "'{}'", ts.to_rfc3339()),
            SqlValue::Json(v) => write!(f, "{}", v),
        }
    }
}

/// Render one row the way `query_data` reports it: `(1, 'abc', NULL)`.
///
/// Text uses SQL literal quoting, so an embedded quote is doubled:
/// `'O''Brien'`.
pub fn render_tuple(row: &[SqlValue]) -> String {
    let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
    format!("({})", cells.join(", "))
}
