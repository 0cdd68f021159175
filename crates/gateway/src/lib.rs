//! Statement gateway between table variants and PostgreSQL
//!
//! Every piece of SQL a table sends is composed here: identifiers only enter
//! statements as validated, quoted [`Ident`]s, values only as bind parameters,
//! and free SQL text only as `&'static str` fragments.

mod descriptor;
mod executor;
mod identifier;
pub mod mock;
mod statement;

pub use descriptor::TableDescriptor;
pub use executor::{PgEngine, SqlEngine};
pub use identifier::{validate_identifier, Ident, MAX_IDENTIFIER_LEN};
pub use statement::{ColumnCast, Statement, StatementBuilder};
