//! SQL Explorer MCP Server - Main entry point.
//!
//! This server exposes one SQL database (PostgreSQL, MySQL or SQLite) to MCP
//! clients: ad-hoc queries, table listing, column metadata and a schema
//! resource.

use sql_explorer_mcp::config::{Config, TransportMode};
use sql_explorer_mcp::db::ConnectionProvider;
use sql_explorer_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting SQL Explorer MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let connection_config = match config.connection_config() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid database configuration");
            return ExitCode::FAILURE;
        }
    };

    let provider = match ConnectionProvider::connect(connection_config, config.retry_policy()).await
    {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(
                error = %e,
                suggestion = e.suggestion().unwrap_or_default(),
                "Could not connect to the database"
            );
            return ExitCode::FAILURE;
        }
    };

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(provider).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                provider,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}
