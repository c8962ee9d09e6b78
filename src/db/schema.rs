//! Schema introspection module.
//!
//! This module provides database schema introspection functionality
//! for SQLite, PostgreSQL, and MySQL databases.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Every introspection call is an ordinary SQL execution routed
//! through [`QueryExecutor`], so catalog failures are normalized exactly like
//! user queries. Nothing is cached.
//!
//! # Trust boundary
//!
//! `describe_table` splices the table name into the catalog query text as-is.
//! It is neither bound as a parameter nor checked against an allow-list: the
//! caller is trusted the same way `execute_sql_query` trusts its SQL.

use crate::db::executor::QueryExecutor;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, DatabaseType, QueryResult, SchemaDocument};
use tracing::debug;

/// Schema inspector for database introspection.
#[derive(Debug, Clone)]
pub struct SchemaInspector {
    executor: QueryExecutor,
}

impl SchemaInspector {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    fn db_type(&self) -> DatabaseType {
        self.executor.provider().db_type()
    }

    /// List base tables as `schema_name, table_name`, ordered by schema then
    /// table.
    pub async fn list_tables(&self) -> QueryResult {
        let sql = match self.db_type() {
            DatabaseType::PostgreSQL => queries::postgres::LIST_TABLES,
            DatabaseType::MySQL => queries::mysql::LIST_TABLES,
            DatabaseType::SQLite => queries::sqlite::LIST_TABLES,
        };
        self.executor.execute(sql).await
    }

    /// Column metadata for one table as `column_name, data_type, max_length,
    /// is_nullable`, in ordinal order.
    ///
    /// An unknown table yields an empty row set rather than an error.
    pub async fn describe_table(&self, table_name: &str) -> QueryResult {
        debug!(table = %table_name, "Describing table");
        let sql = describe_table_sql(self.db_type(), table_name);
        self.executor.execute(&sql).await
    }

    /// Every table and its columns, shaped into a [`SchemaDocument`].
    pub async fn schema(&self) -> DbResult<SchemaDocument> {
        let sql = match self.db_type() {
            DatabaseType::PostgreSQL => queries::postgres::ALL_COLUMNS,
            DatabaseType::MySQL => queries::mysql::ALL_COLUMNS,
            DatabaseType::SQLite => queries::sqlite::ALL_COLUMNS,
        };
        let result = self.executor.execute(sql).await;
        build_document(&result)
    }
}

fn describe_table_sql(db_type: DatabaseType, table_name: &str) -> String {
    match db_type {
        DatabaseType::PostgreSQL => queries::postgres::DESCRIBE_TABLE.replace("{table}", table_name),
        DatabaseType::MySQL => {
            // `schema.table` targets another database on the same server
            let (schema, table) = match table_name.split_once('.') {
                Some((schema, table)) => (format!("'{}'", schema), table),
                None => ("DATABASE()".to_string(), table_name),
            };
            queries::mysql::DESCRIBE_TABLE
                .replace("{schema}", &schema)
                .replace("{table}", table)
        }
        DatabaseType::SQLite => queries::sqlite::DESCRIBE_TABLE.replace("{table}", table_name),
    }
}

/// Shape catalog rows `(table, column, type, length, nullable)` into a
/// document.
fn build_document(result: &QueryResult) -> DbResult<SchemaDocument> {
    if let Some(message) = result.error() {
        return Err(DbError::database(
            message,
            None,
            "Check that the connected user can read the system catalog",
        ));
    }

    let mut document = SchemaDocument::new();
    for row in result.result_rows() {
        match ColumnDescriptor::from_catalog_row(row) {
            Some((table, column)) => document.push_column(table, column),
            None => debug!(row = ?row, "Skipping malformed catalog row"),
        }
    }
    Ok(document)
}

// =============================================================================
// SQL Query Templates
// =============================================================================
//
// Centralized SQL queries for schema introspection. Each database has its own
// submodule with queries adapted to its specific system catalogs. All three
// produce the same column names so callers never branch on the backend.

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT
                n.nspname::text AS schema_name,
                c.relname::text AS table_name
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
            AND n.nspname NOT IN ('pg_catalog', 'information_schema')
            AND n.nspname NOT LIKE 'pg_toast%'
            ORDER BY n.nspname, c.relname
            "#;

        /// Fixed-width types report their byte size, character types their
        /// declared length.
        pub const DESCRIBE_TABLE: &str = r#"
            SELECT
                a.attname::text AS column_name,
                t.typname::text AS data_type,
                CASE
                    WHEN a.attlen > 0 THEN a.attlen::int8
                    WHEN t.typcategory = 'S' AND a.atttypmod > 4 THEN (a.atttypmod - 4)::int8
                    ELSE NULL
                END AS max_length,
                NOT a.attnotnull AS is_nullable
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
            WHERE a.attrelid = to_regclass('{table}')
            AND a.attnum > 0
            AND NOT a.attisdropped
            ORDER BY a.attnum
            "#;

        pub const ALL_COLUMNS: &str = r#"
            SELECT
                c.relname::text AS table_name,
                a.attname::text AS column_name,
                t.typname::text AS data_type,
                CASE
                    WHEN a.attlen > 0 THEN a.attlen::int8
                    WHEN t.typcategory = 'S' AND a.atttypmod > 4 THEN (a.atttypmod - 4)::int8
                    ELSE NULL
                END AS max_length,
                NOT a.attnotnull AS is_nullable
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
            JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
            WHERE c.relkind IN ('r', 'p')
            AND n.nspname NOT IN ('pg_catalog', 'information_schema')
            AND n.nspname NOT LIKE 'pg_toast%'
            AND a.attnum > 0
            AND NOT a.attisdropped
            ORDER BY c.relname, n.nspname, a.attnum
            "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT
                CONVERT(TABLE_SCHEMA USING utf8mb4) AS schema_name,
                CONVERT(TABLE_NAME USING utf8mb4) AS table_name
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_SCHEMA, TABLE_NAME
            "#;

        pub const DESCRIBE_TABLE: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8mb4) AS column_name,
                CONVERT(DATA_TYPE USING utf8mb4) AS data_type,
                CHARACTER_MAXIMUM_LENGTH AS max_length,
                CASE WHEN IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS is_nullable
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = {schema}
            AND TABLE_NAME = '{table}'
            ORDER BY ORDINAL_POSITION
            "#;

        pub const ALL_COLUMNS: &str = r#"
            SELECT
                CONVERT(c.TABLE_NAME USING utf8mb4) AS table_name,
                CONVERT(c.COLUMN_NAME USING utf8mb4) AS column_name,
                CONVERT(c.DATA_TYPE USING utf8mb4) AS data_type,
                c.CHARACTER_MAXIMUM_LENGTH AS max_length,
                CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS is_nullable
            FROM information_schema.COLUMNS c
            JOIN information_schema.TABLES t
                ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
            WHERE c.TABLE_SCHEMA = DATABASE()
            AND t.TABLE_TYPE = 'BASE TABLE'
            ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT 'main' AS schema_name, name AS table_name
            FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;

        /// The length is read from the declared type, e.g. `VARCHAR(50)`.
        pub const DESCRIBE_TABLE: &str = r#"
            SELECT
                name AS column_name,
                type AS data_type,
                CASE
                    WHEN instr(type, '(') > 0 THEN CAST(substr(type, instr(type, '(') + 1) AS INTEGER)
                    ELSE NULL
                END AS max_length,
                CASE WHEN "notnull" = 0 THEN 1 ELSE 0 END AS is_nullable
            FROM pragma_table_info('{table}')
            ORDER BY cid
            "#;

        pub const ALL_COLUMNS: &str = r#"
            SELECT
                m.name AS table_name,
                p.name AS column_name,
                p.type AS data_type,
                CASE
                    WHEN instr(p.type, '(') > 0 THEN CAST(substr(p.type, instr(p.type, '(') + 1) AS INTEGER)
                    ELSE NULL
                END AS max_length,
                CASE WHEN p."notnull" = 0 THEN 1 ELSE 0 END AS is_nullable
            FROM sqlite_master m, pragma_table_info(m.name) p
            WHERE m.type = 'table'
            AND m.name NOT LIKE 'sqlite_%'
            ORDER BY m.name, p.cid
            "#;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SqlValue;

    #[test]
    fn test_describe_table_sql_splices_name() {
        let sql = describe_table_sql(DatabaseType::PostgreSQL, "public.orders");
        assert!(sql.contains("to_regclass('public.orders')"));

        let sql = describe_table_sql(DatabaseType::SQLite, "orders");
        assert!(sql.contains("pragma_table_info('orders')"));
    }

    #[test]
    fn test_describe_table_sql_mysql_schema_prefix() {
        let sql = describe_table_sql(DatabaseType::MySQL, "orders");
        assert!(sql.contains("TABLE_SCHEMA = DATABASE()"));
        assert!(sql.contains("TABLE_NAME = 'orders'"));

        let sql = describe_table_sql(DatabaseType::MySQL, "sales.orders");
        assert!(sql.contains("TABLE_SCHEMA = 'sales'"));
        assert!(sql.contains("TABLE_NAME = 'orders'"));
    }

    #[test]
    fn test_build_document_groups_rows() {
        let text = |s: &str| SqlValue::Text(s.to_string());
        let result = QueryResult::rows(
            vec![
                "table_name".to_string(),
                "column_name".to_string(),
                "data_type".to_string(),
                "max_length".to_string(),
                "is_nullable".to_string(),
            ],
            vec![
                vec![text("a"), text("id"), text("INTEGER"), SqlValue::Null, SqlValue::Int(0)],
                vec![text("a"), text("name"), text("VARCHAR(20)"), SqlValue::Int(20), SqlValue::Int(1)],
                vec![text("b"), text("x"), text("REAL"), SqlValue::Null, SqlValue::Bool(true)],
            ],
        );
        let doc = build_document(&result).unwrap();
        assert_eq!(doc.table_count(), 2);
        let a = doc.table("a").unwrap();
        assert_eq!(a.len(), 2);
        assert!(!a[0].nullable);
        assert_eq!(a[1].length, Some(20));
        assert!(doc.table("b").unwrap()[0].nullable);
    }

    #[test]
    fn test_build_document_propagates_failure() {
        let err = build_document(&QueryResult::failure("permission denied")).unwrap_err();
        assert_eq!(err.message(), "permission denied");
    }
}
