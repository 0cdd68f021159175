//! Engine boundary

mod convert;
mod postgres;

pub use postgres::PgEngine;

use async_trait::async_trait;
use pg_tables_models::{Row, TableResult};

use crate::Statement;

/// A database engine able to run composed statements.
///
/// Tables receive an `Arc<dyn SqlEngine>` at construction; nothing in the
/// table layer knows about connections or pools.
#[async_trait]
pub trait SqlEngine: Send + Sync {
    /// Run a statement and return its rows
    async fn fetch_all(&self, statement: &Statement) -> TableResult<Vec<Row>>;

    /// Run a statement and return the affected row count
    async fn execute(&self, statement: &Statement) -> TableResult<u64>;

    /// Run a multi-statement script as one round trip. Scripts carry no binds.
    async fn execute_batch(&self, script: &Statement) -> TableResult<()>;

    async fn fetch_optional(&self, statement: &Statement) -> TableResult<Option<Row>> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }
}
