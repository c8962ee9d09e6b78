//! MCP server integration module.
//!
//! This module provides the integration between the MCP protocol and
//! the database layer using the rmcp framework.

pub mod service;

pub use service::{ExplorerService, SCHEMA_RESOURCE_URI};
