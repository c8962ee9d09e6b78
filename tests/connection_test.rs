//! Integration tests for the connection provider lifecycle.
//!
//! Tests verify that:
//! - The startup probe gives up after the configured number of attempts
//! - Shutdown makes later executions fail inside the result
//! - Concurrent calls sharing one connection never interleave

use sql_explorer_mcp::config::{PoolOptions, RetryPolicy};
use sql_explorer_mcp::db::{ConnectionProvider, QueryExecutor};
use sql_explorer_mcp::error::DbError;
use sql_explorer_mcp::models::{ConnectionConfig, DatabaseType, SqlValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

fn temp_db_url() -> String {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    format!("sqlite:{}?mode=rwc", db_path)
}

async fn connect(url: &str, pool_options: PoolOptions) -> Arc<ConnectionProvider> {
    let config = ConnectionConfig::from_url(url, pool_options).unwrap();
    let provider = ConnectionProvider::connect(config, RetryPolicy::new(1, Duration::ZERO))
        .await
        .unwrap();
    Arc::new(provider)
}

#[tokio::test]
async fn test_connect_reports_server_version() {
    let provider = connect(&temp_db_url(), PoolOptions::default()).await;
    assert_eq!(provider.db_type(), DatabaseType::SQLite);
    assert!(provider.server_version().is_some());
    assert!(!provider.is_closed());
    provider.probe().await.unwrap();
}

#[tokio::test]
async fn test_connect_gives_up_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    // Without mode=rwc SQLite refuses to create the missing file
    let url = format!(
        "sqlite:{}",
        dir.path().join("missing").join("nope.db").display()
    );
    let config = ConnectionConfig::from_url(
        &url,
        PoolOptions {
            acquire_timeout_secs: Some(2),
            ..Default::default()
        },
    )
    .unwrap();

    let delay = Duration::from_millis(50);
    let start = Instant::now();
    let err = ConnectionProvider::connect(config, RetryPolicy::new(2, delay))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Connection { .. }));
    assert!(err.message().contains("after 2 attempt(s)"));
    assert!(err.suggestion().is_some());
    // One delay separates the two attempts
    assert!(start.elapsed() >= delay);
}

#[tokio::test]
async fn test_shutdown_fails_later_executions() {
    let provider = connect(&temp_db_url(), PoolOptions::default()).await;
    let executor = QueryExecutor::new(provider.clone());
    assert!(!executor.execute("SELECT 1").await.is_error());

    provider.shutdown().await;
    assert!(provider.is_closed());
    // A second shutdown is a no-op
    provider.shutdown().await;

    let result = executor.execute("SELECT 1").await;
    assert!(result.is_error());
    assert!(result.columns().is_empty());
    assert_eq!(result.row_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_share_one_connection() {
    let provider = connect(
        &temp_db_url(),
        PoolOptions {
            max_connections: Some(1),
            ..Default::default()
        },
    )
    .await;
    let executor = QueryExecutor::new(provider);

    executor
        .execute("CREATE TABLE items (id INTEGER PRIMARY KEY, tag TEXT NOT NULL)")
        .await;
    let insert = executor
        .execute(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 200) \
             INSERT INTO items (id, tag) SELECT n, 'tag' || (n % 10) FROM seq",
        )
        .await;
    assert_eq!(insert.row_count(), 200);

    let mut handles = Vec::new();
    for i in 0..32u32 {
        let executor = executor.clone();
        handles.push(tokio::spawn(async move {
            let tag = format!("tag{}", i % 10);
            let result = executor
                .execute(&format!(
                    "SELECT id, tag FROM items WHERE tag = '{}' ORDER BY id",
                    tag
                ))
                .await;
            (tag, result)
        }));
    }

    for handle in handles {
        let (tag, result) = handle.await.unwrap();
        assert!(!result.is_error(), "{:?}", result.error());
        assert_eq!(result.columns(), ["id", "tag"]);
        assert_eq!(result.row_count(), 20);
        for row in result.result_rows() {
            assert_eq!(row.len(), 2);
            assert_eq!(row[1], SqlValue::Text(tag.clone()));
        }
    }
}
