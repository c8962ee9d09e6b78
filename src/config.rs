//! Configuration handling for the SQL Explorer MCP server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::models::{ConnectionConfig, ConnectionConfigError, ConnectionParts, DatabaseType};
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_LLM_SERVER_URL: &str = "http://llm-server:8080";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

// Startup probe defaults
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;
pub const DEFAULT_CONNECT_RETRY_DELAY_SECS: u64 = 5;

/// Connection pool configuration options.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 5 for MySQL/PostgreSQL, 1 for SQLite)
    pub max_connections: Option<u32>,
    /// Minimum connections in pool (default: 1)
    pub min_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Whether to test connections before use (default: true)
    pub test_before_acquire: Option<bool>,
}

impl PoolOptions {
    /// Get max_connections with default value based on database type.
    pub fn max_connections_or_default(&self, is_sqlite: bool) -> u32 {
        self.max_connections.unwrap_or(if is_sqlite {
            DEFAULT_MAX_CONNECTIONS_SQLITE
        } else {
            DEFAULT_MAX_CONNECTIONS
        })
    }

    /// Get min_connections with default value, never above the pool size.
    pub fn min_connections_or_default(&self, is_sqlite: bool) -> u32 {
        self.min_connections
            .unwrap_or(DEFAULT_MIN_CONNECTIONS)
            .min(self.max_connections_or_default(is_sqlite))
    }

    pub fn idle_timeout_or_default(&self) -> u64 {
        self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
    }

    pub fn acquire_timeout_or_default(&self) -> u64 {
        self.acquire_timeout_secs
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }

    pub fn test_before_acquire_or_default(&self) -> bool {
        self.test_before_acquire.unwrap_or(true)
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_connections {
            if max == 0 {
                return Err("max_connections must be greater than 0".to_string());
            }
        }
        if let Some(min) = self.min_connections {
            if min == 0 {
                return Err("min_connections must be greater than 0".to_string());
            }
            if let Some(max) = self.max_connections {
                if min > max {
                    return Err(format!(
                        "min_connections ({}) cannot exceed max_connections ({})",
                        min, max
                    ));
                }
            }
        }
        if self.acquire_timeout_secs == Some(0) {
            return Err("acquire_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// How many times the startup liveness probe runs, and how long to wait
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONNECT_RETRIES,
            Duration::from_secs(DEFAULT_CONNECT_RETRY_DELAY_SECS),
        )
    }
}

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the SQL Explorer MCP server.
#[derive(Clone, Parser)]
#[command(
    name = "sql-explorer-mcp",
    about = "MCP server exposing a SQL database to assistants: ad-hoc queries, table listing, column metadata and a schema resource",
    version,
    author
)]
pub struct Config {
    /// Full connection URL. Overrides the discrete --db-* fields when set.
    #[arg(long, value_name = "URL", env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Database backend
    #[arg(long, value_enum, default_value = "postgres", env = "DB_TYPE")]
    pub db_type: DatabaseType,

    /// Database host
    #[arg(long, default_value = "localhost", env = "DB_HOST")]
    pub db_host: String,

    /// Database port (defaults to the backend's standard port)
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    /// Database name, or the file path for SQLite
    #[arg(long, default_value = "postgres", env = "DB_NAME")]
    pub db_name: String,

    /// Database user
    #[arg(long, default_value = "postgres", env = "DB_USER")]
    pub db_user: String,

    /// Database password (sensitive - not logged)
    #[arg(long, default_value = "", env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Accept the server certificate without verifying it
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        env = "DB_TRUST_SERVER_CERTIFICATE"
    )]
    pub trust_server_certificate: bool,

    /// Maximum pooled connections (1 serializes every query)
    #[arg(long, env = "MAX_CONCURRENT_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Seconds to wait for a free connection
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "DB_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,

    /// Startup liveness probe attempts
    #[arg(long, default_value_t = DEFAULT_CONNECT_RETRIES, env = "DB_CONNECT_RETRIES")]
    pub connect_retries: u32,

    /// Seconds between startup probe attempts
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_RETRY_DELAY_SECS,
        env = "DB_CONNECT_RETRY_DELAY"
    )]
    pub connect_retry_delay: u64,

    /// Language-model server used by collaborating components
    #[arg(long, default_value = DEFAULT_LLM_SERVER_URL, env = "LLM_SERVER_URL")]
    pub llm_server_url: String,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "****"))
            .field("db_type", &self.db_type)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("max_connections", &self.max_connections)
            .field("transport", &self.transport)
            .field("http_bind_addr", &self.http_bind_addr())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database_url: None,
            db_type: DatabaseType::PostgreSQL,
            db_host: "localhost".to_string(),
            db_port: None,
            db_name: "postgres".to_string(),
            db_user: "postgres".to_string(),
            db_password: String::new(),
            trust_server_certificate: true,
            max_connections: None,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            connect_retry_delay: DEFAULT_CONNECT_RETRY_DELAY_SECS,
            llm_server_url: DEFAULT_LLM_SERVER_URL.to_string(),
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.max_connections,
            acquire_timeout_secs: Some(self.acquire_timeout),
            ..PoolOptions::default()
        }
    }

    /// Assemble the connection configuration, preferring a full URL over the
    /// discrete fields.
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConnectionConfigError> {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => {
                ConnectionConfig::from_url(url.trim(), self.pool_options())
            }
            _ => {
                let parts = ConnectionParts {
                    db_type: self.db_type,
                    host: self.db_host.clone(),
                    port: self.db_port,
                    database: self.db_name.clone(),
                    username: self.db_user.clone(),
                    password: self.db_password.clone(),
                    trust_server_certificate: self.trust_server_certificate,
                };
                ConnectionConfig::from_parts(&parts, self.pool_options())
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_retries,
            Duration::from_secs(self.connect_retry_delay),
        )
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
