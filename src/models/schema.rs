//! Schema-related data models.
//!
//! The schema document maps each table name to its columns in catalog
//! ordinal order. It is derived on every request and never cached.

use crate::models::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One column entry of the schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// Declared maximum length, when the type has one
    pub length: Option<i64>,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(column: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            column: column.into(),
            data_type: data_type.into(),
            length: None,
            nullable,
        }
    }

    pub fn with_length(mut self, length: Option<i64>) -> Self {
        self.length = length;
        self
    }

    /// Build a descriptor from one catalog row laid out as
    /// `(table, column, type, length, nullable)`.
    pub(crate) fn from_catalog_row(row: &[SqlValue]) -> Option<(String, Self)> {
        let table = row.first()?.as_str()?.to_string();
        let column = row.get(1)?.as_str()?.to_string();
        let data_type = row
            .get(2)
            .and_then(SqlValue::as_str)
            .unwrap_or_default()
            .to_string();
        let length = row.get(3).and_then(SqlValue::as_i64);
        let nullable = row.get(4).and_then(SqlValue::as_bool).unwrap_or(true);

        Some((
            table,
            ColumnDescriptor::new(column, data_type, nullable).with_length(length),
        ))
    }
}

/// Table name to ordered column list. Tables iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument {
    tables: BTreeMap<String, Vec<ColumnDescriptor>>,
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to a table, creating the table entry on first use.
    pub fn push_column(&mut self, table: impl Into<String>, column: ColumnDescriptor) {
        self.tables.entry(table.into()).or_default().push(column);
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &Vec<ColumnDescriptor>)> {
        self.tables.iter()
    }

    pub fn table(&self, name: &str) -> Option<&[ColumnDescriptor]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Pretty JSON, the body of the `schema://main` resource.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Indented tree listing: each table, then `  column (type)` lines.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for (table, columns) in &self.tables {
            out.push_str(table);
            out.push('\n');
            for col in columns {
                out.push_str(&format!("  {} ({})\n", col.column, col.data_type));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tables_sorted_columns_in_insertion_order() {
        let mut doc = SchemaDocument::new();
        doc.push_column("orders", ColumnDescriptor::new("id", "INTEGER", false));
        doc.push_column("customers", ColumnDescriptor::new("id", "INTEGER", false));
        doc.push_column("orders", ColumnDescriptor::new("total", "REAL", true));

        let names: Vec<&String> = doc.tables().map(|(t, _)| t).collect();
        assert_eq!(names, vec!["customers", "orders"]);

        let orders = doc.table("orders").unwrap();
        assert_eq!(orders[0].column, "id");
        assert_eq!(orders[1].column, "total");
    }

    #[test]
    fn test_serialized_shape() {
        let mut doc = SchemaDocument::new();
        doc.push_column(
            "users",
            ColumnDescriptor::new("name", "VARCHAR", true).with_length(Some(50)),
        );
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"users": [{"column": "name", "type": "VARCHAR", "length": 50, "nullable": true}]})
        );

        let parsed: SchemaDocument =
            serde_json::from_str(&doc.to_pretty_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_from_catalog_row() {
        let row = vec![
            SqlValue::Text("users".to_string()),
            SqlValue::Text("email".to_string()),
            SqlValue::Text("TEXT".to_string()),
            SqlValue::Null,
            SqlValue::Int(0),
        ];
        let (table, col) = ColumnDescriptor::from_catalog_row(&row).unwrap();
        assert_eq!(table, "users");
        assert_eq!(col.column, "email");
        assert_eq!(col.length, None);
        assert!(!col.nullable);
    }

    #[test]
    fn test_from_catalog_row_rejects_short_rows() {
        assert!(ColumnDescriptor::from_catalog_row(&[SqlValue::Text("t".to_string())]).is_none());
    }

    #[test]
    fn test_render_tree() {
        let mut doc = SchemaDocument::new();
        doc.push_column("t", ColumnDescriptor::new("a", "INTEGER", true));
        doc.push_column("t", ColumnDescriptor::new("b", "TEXT", true));
        assert_eq!(doc.render_tree(), "t\n  a (INTEGER)\n  b (TEXT)\n");
    }
}
