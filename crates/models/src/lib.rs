//! Shared types for the pg-tables workspace
//!
//! Error taxonomy, configuration and the small value types every table
//! variant passes around.

pub mod config;
pub mod errors;
pub mod page;

pub use config::*;
pub use errors::*;
pub use page::*;

/// Primary key of every managed table
pub type RowId = i64;

/// A row as returned by the engine, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Caller-supplied column -> value mapping for INSERT/UPDATE
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Name of the primary key column
pub const ID_COLUMN: &str = "id";
