use pg_tables_gateway::{Ident, Statement};
use pg_tables_models::{TableError, TableResult};

/// Per-table DDL hooks.
///
/// `create_table` has no default: a concrete schema must say how its table is
/// created. `alter_table` is optional and reports `NotImplemented` unless
/// overridden. Both receive the validated table name and return a script
/// built with [`Statement::builder`], which is sent as a single batch.
pub trait Schema: Send + Sync {
    fn create_table(&self, table: &Ident) -> TableResult<Statement>;

    fn alter_table(&self, table: &Ident) -> TableResult<Statement> {
        Err(TableError::not_implemented(table.as_str(), "alter"))
    }
}

/// Schema of a table constructed without DDL: both hooks are not implemented
#[derive(Debug, Clone, Copy, Default)]
pub struct Unspecified;

impl Schema for Unspecified {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        Err(TableError::not_implemented(table.as_str(), "create"))
    }
}
