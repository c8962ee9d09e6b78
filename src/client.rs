//! MCP client for the SQL explorer server.
//!
//! [`ExplorerClient`] talks to a running `sql-explorer-mcp` over any rmcp
//! transport. The terminal client spawns the server as a child process and
//! speaks MCP over its stdio; tests connect it to an in-process server over
//! a duplex pipe.

use crate::error::{DbError, DbResult};
use crate::mcp::SCHEMA_RESOURCE_URI;
use crate::models::{QueryResult, SchemaDocument};
use rmcp::{
    RoleClient, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, RawContent, ReadResourceRequestParam,
        ResourceContents,
    },
    service::RunningService,
    transport::{IntoTransport, TokioChildProcess},
};
use serde_json::{Value, json};
use tokio::process::Command;
use tracing::{debug, info};

/// A live MCP session with the explorer server.
pub struct ExplorerClient {
    service: RunningService<RoleClient, ()>,
}

impl ExplorerClient {
    /// Initialize a session over an arbitrary transport.
    pub async fn connect<T, E, A>(transport: T) -> DbResult<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = ().serve(transport).await.map_err(|e| {
            DbError::protocol(format!("Failed to initialize MCP session: {}", e))
        })?;

        if let Some(info) = service.peer_info() {
            info!(
                server = %info.server_info.name,
                version = %info.server_info.version,
                "Connected to MCP server"
            );
        }

        Ok(Self { service })
    }

    /// Spawn the server command and talk to it over its stdio.
    pub async fn spawn(command: Command) -> DbResult<Self> {
        let transport = TokioChildProcess::new(command)
            .map_err(|e| DbError::protocol(format!("Failed to spawn server: {}", e)))?;
        Self::connect(transport).await
    }

    /// Read and parse the `schema://main` resource.
    pub async fn fetch_schema(&self) -> DbResult<SchemaDocument> {
        let result = self
            .service
            .read_resource(ReadResourceRequestParam {
                uri: SCHEMA_RESOURCE_URI.to_string(),
            })
            .await?;

        let text = result
            .contents
            .into_iter()
            .find_map(|contents| match contents {
                ResourceContents::TextResourceContents { text, .. } => Some(text),
                _ => None,
            })
            .ok_or_else(|| DbError::protocol("Schema resource returned no text content"))?;

        if let Some(message) = text.strip_prefix("Error: ") {
            return Err(DbError::database(
                message,
                None,
                "The server could not read its catalog; check its logs",
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| DbError::protocol(format!("Malformed schema document: {}", e)))
    }

    /// Run SQL through the `execute_sql_query` tool.
    pub async fn execute_query(&self, sql: &str) -> DbResult<QueryResult> {
        let result = self
            .call("execute_sql_query", json!({ "query": sql }))
            .await?;
        parse_query_result(result)
    }

    /// Run SQL through the `query_data` tool and return its text.
    pub async fn query_data(&self, sql: &str) -> DbResult<String> {
        let result = self.call("query_data", json!({ "sql": sql })).await?;
        Ok(text_content(&result))
    }

    pub async fn list_tables(&self) -> DbResult<QueryResult> {
        let result = self.call("list_tables", json!({})).await?;
        parse_query_result(result)
    }

    pub async fn table_info(&self, table_name: &str) -> DbResult<QueryResult> {
        let result = self
            .call("get_table_info", json!({ "table_name": table_name }))
            .await?;
        parse_query_result(result)
    }

    /// Close the session. The server side sees end of input and shuts down.
    pub async fn close(self) -> DbResult<()> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| DbError::internal(format!("MCP session task failed: {}", e)))?;
        debug!(reason = ?reason, "MCP session closed");
        Ok(())
    }

    async fn call(&self, name: &'static str, arguments: Value) -> DbResult<CallToolResult> {
        debug!(tool = name, "Calling tool");
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            _ => None,
        };
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: name.into(),
                arguments,
                task: None,
            })
            .await?;
        Ok(result)
    }
}

/// Structured content is preferred; older servers only send text.
fn parse_query_result(result: CallToolResult) -> DbResult<QueryResult> {
    if result.is_error == Some(true) {
        return Err(DbError::protocol(text_content(&result)));
    }

    let parsed = match result.structured_content {
        Some(value) => serde_json::from_value(value),
        None => serde_json::from_str(&text_content(&result)),
    };
    parsed.map_err(|e| DbError::protocol(format!("Malformed query result: {}", e)))
}

fn text_content(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
