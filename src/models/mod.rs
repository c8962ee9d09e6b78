//! Data models for the SQL Explorer MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, ConnectionParts, DatabaseType};
pub use query::QueryResult;
pub use schema::{ColumnDescriptor, SchemaDocument};
pub use value::{SqlValue, render_tuple};
