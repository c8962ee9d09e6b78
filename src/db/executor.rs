//! Query execution engine.
//!
//! Every SQL string goes through [`QueryExecutor`], which is the single point
//! where driver failures are normalized into [`QueryResult`]. Callers never
//! see a `Result`: a failed acquisition, a syntax error, a permission error
//! and a decode problem all come back as `QueryResult::failure`.
//!
//! # Architecture
//!
//! Execution follows the same plan on every backend:
//! 1. Prepare the statement. The prepared description lists the result
//!    columns even when no rows come back.
//! 2. Run it and keep the first result set only: its rows for row-returning
//!    statements, its affected-row count for everything else. Later
//!    statements of a batch still run, but their output is discarded, so
//!    every row always matches the column list.
//! 3. When the server refuses to prepare the text (PostgreSQL batches,
//!    MySQL commands outside the prepared protocol) it is sent once more
//!    through the unprepared text protocol, with the same first-result-set
//!    rule.
//!
//! The per-backend submodules are generated by `impl_backend_execute!` so the
//! three paths stay identical apart from the connection type.

use crate::db::pool::{ConnectionProvider, PooledConnection};
use crate::db::types::RowToValues;
use crate::error::DbError;
use crate::models::QueryResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    provider: Arc<ConnectionProvider>,
}

impl QueryExecutor {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    /// Run one SQL string on a freshly checked-out connection.
    ///
    /// The connection goes back to the pool when this returns, whatever the
    /// outcome.
    pub async fn execute(&self, sql: &str) -> QueryResult {
        let mut conn = match self.provider.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Failed to acquire connection");
                return QueryResult::failure(e.message());
            }
        };
        Self::execute_on(&mut conn, sql).await
    }

    /// Run one SQL string on a connection the caller already holds.
    pub async fn execute_on(conn: &mut PooledConnection, sql: &str) -> QueryResult {
        let start = Instant::now();
        debug!(sql = %sql, db_type = %conn.db_type(), "Executing query");

        let outcome = impl_db_dispatch!(PooledConnection, conn, {
            MySql(c) => mysql::execute(c, sql).await,
            Postgres(c) => postgres::execute(c, sql).await,
            SQLite(c) => sqlite::execute(c, sql).await,
        });

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(result) => {
                debug!(
                    row_count = result.row_count(),
                    columns = result.columns().len(),
                    elapsed_ms,
                    "Query completed"
                );
                result
            }
            Err(e) => {
                let error = DbError::from(e);
                warn!(sql = %sql, error = %error, elapsed_ms, "Query failed");
                QueryResult::failure(error.message())
            }
        }
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// `text_fallback` controls whether a statement the server refuses to prepare
// is retried through the unprepared text protocol. SQLite reports genuine
// errors at prepare time, so it never falls back.

macro_rules! impl_backend_execute {
    ($name:ident, $conn:ty, $db:ty, text_fallback = $fallback:expr) => {
        mod $name {
            use super::*;
            use futures_util::{Stream, TryStreamExt};
            use sqlx::{Column, Database, Either, Executor, Statement};

            type Step = Either<<$db as Database>::QueryResult, <$db as Database>::Row>;

            pub async fn execute(conn: &mut $conn, sql: &str) -> Result<QueryResult, sqlx::Error> {
                let columns: Vec<String> = match (&mut *conn).prepare(sql).await {
                    Ok(statement) => statement
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                    Err(sqlx::Error::Database(e)) if $fallback => {
                        debug!(error = %e, "Statement cannot be prepared, using text protocol");
                        return execute_unprepared(conn, sql).await;
                    }
                    Err(e) => return Err(e),
                };

                let stream = (&mut *conn).fetch_many(sqlx::query(sql));
                first_result_set(stream, columns).await
            }

            async fn execute_unprepared(
                conn: &mut $conn,
                sql: &str,
            ) -> Result<QueryResult, sqlx::Error> {
                let stream = (&mut *conn).fetch_many(sql);
                first_result_set(stream, Vec::new()).await
            }

            /// Collect the first result set and drain the rest of the stream.
            ///
            /// With no known columns they are taken from the first row.
            async fn first_result_set<S>(
                mut stream: S,
                mut columns: Vec<String>,
            ) -> Result<QueryResult, sqlx::Error>
            where
                S: Stream<Item = Result<Step, sqlx::Error>> + Unpin,
            {
                let mut rows = Vec::new();
                let mut affected: Option<u64> = None;

                while let Some(step) = stream.try_next().await? {
                    if affected.is_some() {
                        continue;
                    }
                    match step {
                        Either::Left(done) => affected = Some(done.rows_affected()),
                        Either::Right(row) => {
                            if columns.is_empty() {
                                columns = row.column_names();
                            }
                            rows.push(row.to_values());
                        }
                    }
                }

                Ok(if columns.is_empty() {
                    QueryResult::affected(affected.unwrap_or(0))
                } else {
                    QueryResult::rows(columns, rows)
                })
            }
        }
    };
}

impl_backend_execute!(mysql, sqlx::MySqlConnection, sqlx::MySql, text_fallback = true);
impl_backend_execute!(postgres, sqlx::PgConnection, sqlx::Postgres, text_fallback = true);
impl_backend_execute!(sqlite, sqlx::SqliteConnection, sqlx::Sqlite, text_fallback = false);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolOptions, RetryPolicy};
    use crate::models::{ConnectionConfig, SqlValue};

    async fn memory_executor() -> QueryExecutor {
        let config = ConnectionConfig::from_url("sqlite::memory:", PoolOptions::default()).unwrap();
        let provider = ConnectionProvider::connect(config, RetryPolicy::default())
            .await
            .unwrap();
        QueryExecutor::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_select_literal() {
        let executor = memory_executor().await;
        let result = executor.execute("SELECT 1 AS x").await;
        assert_eq!(result.columns(), ["x"]);
        assert_eq!(result.result_rows(), [vec![SqlValue::Int(1)]]);
        assert_eq!(result.row_count(), 1);
        assert!(result.error().is_none());
    }

    #[tokio::test]
    async fn test_execute_on_held_connection() {
        let executor = memory_executor().await;
        let mut conn = executor.provider().acquire().await.unwrap();

        // In-memory SQLite state lives on the connection, so the table is
        // only visible through the same handle
        let created = QueryExecutor::execute_on(&mut conn, "CREATE TABLE t (v TEXT)").await;
        assert!(!created.is_error());
        let inserted =
            QueryExecutor::execute_on(&mut conn, "INSERT INTO t VALUES ('a'), ('b')").await;
        assert_eq!(inserted.row_count(), 2);
        assert!(inserted.columns().is_empty());

        let selected = QueryExecutor::execute_on(&mut conn, "SELECT v FROM t ORDER BY v").await;
        assert_eq!(selected.row_count(), 2);
        assert_eq!(selected.result_rows()[1], vec![SqlValue::Text("b".to_string())]);
    }

    #[tokio::test]
    async fn test_batch_keeps_first_result_set() {
        let executor = memory_executor().await;
        let result = executor.execute("SELECT 1 AS a; SELECT 2 AS b, 3 AS c").await;
        assert!(!result.is_error(), "{:?}", result.error());
        assert_eq!(result.columns(), ["a"]);
        assert_eq!(result.result_rows(), [vec![SqlValue::Int(1)]]);
        assert_eq!(result.row_count(), 1);
    }

    #[tokio::test]
    async fn test_batch_of_writes_reports_first_count() {
        let executor = memory_executor().await;
        let mut conn = executor.provider().acquire().await.unwrap();
        QueryExecutor::execute_on(&mut conn, "CREATE TABLE t (v INTEGER)").await;

        let result = QueryExecutor::execute_on(
            &mut conn,
            "INSERT INTO t VALUES (1); INSERT INTO t VALUES (2), (3)",
        )
        .await;
        assert!(!result.is_error(), "{:?}", result.error());
        assert!(result.columns().is_empty());
        assert_eq!(result.row_count(), 1);

        // Later statements still run
        let count = QueryExecutor::execute_on(&mut conn, "SELECT COUNT(*) AS n FROM t").await;
        assert_eq!(count.result_rows(), [vec![SqlValue::Int(3)]]);
    }

    #[tokio::test]
    async fn test_syntax_error_becomes_failure() {
        let executor = memory_executor().await;
        let result = executor.execute("SELEC nonsense").await;
        assert!(result.is_error());
        assert!(result.columns().is_empty());
        assert_eq!(result.row_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_provider_becomes_failure() {
        let executor = memory_executor().await;
        executor.provider().shutdown().await;
        let result = executor.execute("SELECT 1").await;
        assert!(result.is_error());
        assert!(!result.error().unwrap().is_empty());
    }
}
