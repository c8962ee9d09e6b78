//! Query-related data models.
//!
//! [`QueryResult`] is the uniform shape of every SQL execution, successful or
//! not. Its fields are private so the only way to build one is through the
//! three constructors, which keep the success and failure shapes apart.

use crate::models::value::{SqlValue, render_tuple};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Normalized outcome of executing one SQL string.
///
/// When `error` is set, `columns` and `rows` are empty and `row_count` is 0.
/// Otherwise `row_count` is `rows.len()` for row-returning statements, or the
/// driver-reported affected-row count for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// Result set column names, in statement order
    columns: Vec<String>,
    /// Result set rows; each row has one value per column
    #[schemars(with = "Vec<Vec<serde_json::Value>>")]
    rows: Vec<Vec<SqlValue>>,
    /// Number of rows returned or affected
    row_count: u64,
    /// Error message if the query failed
    error: Option<String>,
}

impl QueryResult {
    /// Result of a row-returning statement. Columns stay populated even when
    /// no rows come back.
    pub fn rows(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            columns,
            rows,
            row_count,
            error: None,
        }
    }

    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: rows_affected,
            error: None,
        }
    }

    /// A failed execution.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "unknown error".to_string();
        }
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            error: Some(message),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn result_rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Look up a column position by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Text rendering used by `query_data`: one tuple per line, or
    /// `Error: <message>`.
    pub fn to_tuple_text(&self) -> String {
        match &self.error {
            Some(message) => format!("Error: {}", message),
            None => self
                .rows
                .iter()
                .map(|row| render_tuple(row))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
