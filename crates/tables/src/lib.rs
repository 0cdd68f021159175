//! Table archetypes over PostgreSQL
//!
//! Three variants share one contract ([`Table`] + [`RowStore`]):
//!
//! - [`MutableTable`]: CRUD restricted to the table's visible columns
//! - [`CredentialTable`]: a mutable table that hashes passwords on the way in
//!   and verifies them without leaking whether a user exists
//! - [`LedgerTable`]: append-only; `create()` installs row-level security
//!   policies and triggers so the engine itself refuses UPDATE/DELETE/TRUNCATE
//!
//! [`TableRegistry`] holds the shared engine and drives bulk create/alter.

mod access;
mod contract;
pub mod credential;
mod enforcement;
pub mod ledger;
pub mod mutable;
pub mod password;
pub mod registry;
mod schema;

pub use contract::{RowStore, Table};
pub use credential::CredentialTable;
pub use ledger::LedgerTable;
pub use mutable::MutableTable;
pub use registry::TableRegistry;
pub use schema::{Schema, Unspecified};

pub use pg_tables_gateway::mock;
pub use pg_tables_gateway::{ColumnCast, Ident, PgEngine, SqlEngine, Statement, StatementBuilder, TableDescriptor};
pub use pg_tables_models::*;
