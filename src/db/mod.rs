//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool lifecycle (`ConnectionProvider`)
//! - Query execution and result normalization
//! - Schema introspection
//! - Row to value conversion
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{ConnectionProvider, DbPool, PooledConnection};
pub use schema::SchemaInspector;
