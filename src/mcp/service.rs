//! MCP service implementation using rmcp.
//!
//! This module defines the ExplorerService struct with the SQL tools and the
//! `schema://main` resource exposed via the MCP protocol using the rmcp
//! framework's macros.
//!
//! The adapter validates nothing: every call is forwarded as-is, and query
//! failures come back inside the result rather than as protocol errors.

use crate::db::{ConnectionProvider, QueryExecutor, SchemaInspector};
use crate::models::QueryResult;
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, Implementation, ListResourcesResult, PaginatedRequestParam,
        ProtocolVersion, RawResource, ReadResourceRequestParam, ReadResourceResult, Resource,
        ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// URI of the schema document resource.
pub const SCHEMA_RESOURCE_URI: &str = "schema://main";

/// Input for the execute_sql_query tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteSqlQueryInput {
    /// SQL text to run verbatim
    pub query: String,
}

/// Input for the get_table_info tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTableInfoInput {
    /// Table to describe. PostgreSQL accepts `schema.table`, MySQL accepts
    /// `database.table`.
    pub table_name: String,
}

/// Input for the query_data tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryDataInput {
    /// SQL text to run verbatim
    pub sql: String,
}

#[derive(Clone)]
pub struct ExplorerService {
    executor: QueryExecutor,
    inspector: SchemaInspector,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl ExplorerService {
    /// Create a service over a connected provider.
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        let executor = QueryExecutor::new(provider);
        Self {
            inspector: SchemaInspector::new(executor.clone()),
            executor,
            tool_router: Self::tool_router(),
        }
    }

    /// Body of the `schema://main` resource: pretty JSON, or
    /// `Error: <message>`.
    async fn schema_text(&self) -> String {
        match self.inspector.schema().await {
            Ok(document) => match document.to_pretty_json() {
                Ok(text) => text,
                Err(e) => format!("Error: {}", e),
            },
            Err(e) => format!("Error: {}", e.message()),
        }
    }

    fn schema_resource() -> Resource {
        let mut raw = RawResource::new(SCHEMA_RESOURCE_URI, "schema");
        raw.description =
            Some("Every table with its columns, types, lengths and nullability".to_string());
        raw.mime_type = Some("application/json".to_string());
        raw.no_annotation()
    }
}

#[tool_router]
impl ExplorerService {
    #[tool(
        description = "Execute a SQL statement and return the result.\nReturns columns, rows, row_count and error. Statements that return no rows report the affected row count.\nFailures are reported in the error field, never as a protocol error."
    )]
    async fn execute_sql_query(
        &self,
        Parameters(input): Parameters<ExecuteSqlQueryInput>,
    ) -> Json<QueryResult> {
        Json(self.executor.execute(&input.query).await)
    }

    #[tool(
        description = "Describe the columns of a table.\nReturns column_name, data_type, max_length and is_nullable in ordinal order. An unknown table returns no rows."
    )]
    async fn get_table_info(
        &self,
        Parameters(input): Parameters<GetTableInfoInput>,
    ) -> Json<QueryResult> {
        Json(self.inspector.describe_table(&input.table_name).await)
    }

    #[tool(
        description = "List all base tables.\nReturns schema_name and table_name ordered by schema, then table."
    )]
    async fn list_tables(&self) -> Json<QueryResult> {
        Json(self.inspector.list_tables().await)
    }

    #[tool(
        description = "Run a SQL statement and return its rows as text, one tuple per line, e.g. (1, 'Alice', NULL).\nFailures are returned as \"Error: <message>\"."
    )]
    async fn query_data(&self, Parameters(input): Parameters<QueryDataInput>) -> String {
        self.executor.execute(&input.sql).await.to_tuple_text()
    }
}

#[tool_handler]
impl ServerHandler for ExplorerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "sql-explorer-mcp".to_owned(),
                title: Some("SQL Explorer MCP".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Default::default()
            },
            instructions: Some(
                "SQL tools for exploring a single database.\n\
                \n\
                ## Workflow\n\
                1. Read the `schema://main` resource, or call `list_tables`, to see what exists\n\
                2. Call `get_table_info` for column types of a specific table\n\
                3. Run SQL with `execute_sql_query` (structured) or `query_data` (text tuples)\n\
                \n\
                SQL is executed verbatim on the configured connection. Errors are returned in the\n\
                result (`error` field, or an `Error: ...` line), not as protocol failures."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![
            Self::schema_resource(),
        ]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        debug!(uri = %request.uri, "Reading resource");
        if request.uri != SCHEMA_RESOURCE_URI {
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            ));
        }

        let text = self.schema_text().await;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}
