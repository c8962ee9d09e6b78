//! Presentation helpers shared by the client binary.
//!
//! - `format`: ASCII table, markdown and JSON rendering of query results

pub mod format;

pub use format::{OutputFormat, format_as_markdown, format_as_table, render};
