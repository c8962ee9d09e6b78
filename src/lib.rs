//! SQL Explorer MCP Library
//!
//! Exposes one relational database (SQLite, PostgreSQL, MySQL) to MCP clients
//! as four SQL tools and a `schema://main` resource, and ships the client side
//! used by the terminal front end.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use client::ExplorerClient;
pub use config::Config;
pub use db::ConnectionProvider;
pub use error::DbError;
pub use mcp::ExplorerService;
