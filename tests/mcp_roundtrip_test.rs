//! End-to-end tests of the MCP surface.
//!
//! The server runs in-process on one end of a duplex pipe and
//! `ExplorerClient` drives it from the other, so every call goes through the
//! real JSON-RPC encoding.

use rmcp::ServiceExt;
use sql_explorer_mcp::client::ExplorerClient;
use sql_explorer_mcp::config::{PoolOptions, RetryPolicy};
use sql_explorer_mcp::db::ConnectionProvider;
use sql_explorer_mcp::mcp::ExplorerService;
use sql_explorer_mcp::models::{ConnectionConfig, SqlValue};
use sql_explorer_mcp::tools::{OutputFormat, render};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

async fn start_session() -> (ExplorerClient, Arc<ConnectionProvider>) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let conn_url = format!("sqlite:{}?mode=rwc", db_path);
    let config = ConnectionConfig::from_url(&conn_url, PoolOptions::default()).unwrap();
    let provider = Arc::new(
        ConnectionProvider::connect(config, RetryPolicy::new(1, Duration::ZERO))
            .await
            .unwrap(),
    );

    let (server_io, client_io) = tokio::io::duplex(4096);
    let service = ExplorerService::new(provider.clone());
    tokio::spawn(async move {
        if let Ok(running) = service.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });

    let client = ExplorerClient::connect(client_io).await.unwrap();
    (client, provider)
}

#[tokio::test]
async fn test_execute_query_over_mcp() {
    let (client, _provider) = start_session().await;

    let result = client.execute_query("SELECT 1 AS x").await.unwrap();
    assert_eq!(result.columns(), ["x"]);
    assert_eq!(result.result_rows(), [vec![SqlValue::Int(1)]]);
    assert_eq!(result.row_count(), 1);
    assert!(result.error().is_none());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_query_failure_is_not_a_protocol_error() {
    let (client, _provider) = start_session().await;

    let result = client
        .execute_query("SELECT * FROM no_such_table")
        .await
        .unwrap();
    assert!(result.error().unwrap().contains("no such table"));
    assert_eq!(result.row_count(), 0);
    assert_eq!(
        render(&result, OutputFormat::Table),
        format!("Error: {}", result.error().unwrap())
    );

    // The session survives a failed query
    let result = client.execute_query("SELECT 2 AS y").await.unwrap();
    assert_eq!(result.row_count(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_and_table_tools_over_mcp() {
    let (client, _provider) = start_session().await;

    let empty = client.fetch_schema().await.unwrap();
    assert!(empty.is_empty());

    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(40) NOT NULL)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, body TEXT)",
        "INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob')",
    ] {
        let result = client.execute_query(sql).await.unwrap();
        assert!(!result.is_error(), "{:?}", result.error());
    }

    let schema = client.fetch_schema().await.unwrap();
    assert_eq!(schema.table_count(), 2);
    assert_eq!(schema.table("users").unwrap()[1].length, Some(40));

    let tables = client.list_tables().await.unwrap();
    assert_eq!(
        tables.result_rows(),
        [
            vec![SqlValue::Text("main".into()), SqlValue::Text("posts".into())],
            vec![SqlValue::Text("main".into()), SqlValue::Text("users".into())],
        ]
    );

    let info = client.table_info("posts").await.unwrap();
    assert_eq!(info.row_count(), 3);
    let missing = client.table_info("nothing_here").await.unwrap();
    assert!(!missing.is_error());
    assert_eq!(missing.row_count(), 0);

    let text = client
        .query_data("SELECT id, name FROM users ORDER BY id")
        .await
        .unwrap();
    assert_eq!(text, "(1, 'Alice')\n(2, 'Bob')");

    let text = client.query_data("SELECT * FROM nope").await.unwrap();
    assert!(text.starts_with("Error: "));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_error_surfaces_to_client() {
    let (client, provider) = start_session().await;

    provider.shutdown().await;
    let err = client.fetch_schema().await.unwrap_err();
    assert!(!err.message().is_empty());

    let result = client.execute_query("SELECT 1").await.unwrap();
    assert!(result.is_error());

    client.close().await.unwrap();
}
