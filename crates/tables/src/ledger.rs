//! Append-only ledger table

use async_trait::async_trait;
use pg_tables_gateway::{SqlEngine, TableDescriptor};
use pg_tables_models::{Payload, Row, RowId, TableConfig, TableError, TableResult};
use std::sync::Arc;
use tracing::{info, warn};

use crate::access::TableAccess;
use crate::enforcement::{enforcement_script, guard_alter};
use crate::{RowStore, Schema, Table, Unspecified};

/// Rows can be appended and read, never changed.
///
/// `update` and `delete` fail in-process. `create` also installs the
/// enforcement script, after which the engine refuses UPDATE, DELETE and
/// TRUNCATE from any session, including ones that bypass this type.
pub struct LedgerTable<S = Unspecified> {
    access: TableAccess,
    schema: S,
}

impl LedgerTable<Unspecified> {
    pub fn new(engine: Arc<dyn SqlEngine>, descriptor: TableDescriptor) -> Self {
        Self::with_schema(engine, descriptor, Unspecified)
    }
}

impl<S: Schema> LedgerTable<S> {
    pub fn with_schema(engine: Arc<dyn SqlEngine>, descriptor: TableDescriptor, schema: S) -> Self {
        Self {
            access: TableAccess::new(engine, descriptor),
            schema,
        }
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.access.set_config(config);
        self
    }

    /// Install (or reinstall) policies and triggers on an existing table
    pub async fn enforce(&self) -> TableResult<()> {
        let script = enforcement_script(self.access.table())?;
        self.access.run_script(&script).await?;
        info!(table = self.name(), "Ledger enforcement installed");
        Ok(())
    }
}

#[async_trait]
impl<S: Schema> Table for LedgerTable<S> {
    fn descriptor(&self) -> &TableDescriptor {
        self.access.descriptor()
    }

    async fn create(&self) -> TableResult<()> {
        let table = self.access.table();
        let script = self.schema.create_table(table)?;
        // Derived names are checked before any DDL runs
        let enforcement = enforcement_script(table)?;

        self.access.run_script(&script).await?;
        self.access.run_script(&enforcement).await?;
        info!(table = self.name(), "Created ledger table");
        Ok(())
    }

    async fn alter(&self) -> TableResult<()> {
        let table = self.access.table();
        let script = self.schema.alter_table(table)?;
        if let Err(e) = guard_alter(table, &script) {
            warn!(table = self.name(), error = %e, "Refused ledger alter");
            return Err(e);
        }

        self.access.run_script(&script).await?;
        self.enforce().await?;
        info!(table = self.name(), "Altered ledger table");
        Ok(())
    }
}

#[async_trait]
impl<S: Schema> RowStore for LedgerTable<S> {
    async fn insert(&self, payload: Payload) -> TableResult<RowId> {
        self.access.insert(payload).await
    }

    async fn fetch(&self, row_id: RowId) -> TableResult<Option<Row>> {
        self.access.fetch(row_id).await
    }

    async fn list(&self, limit: i64, page_number: i64) -> TableResult<Vec<Row>> {
        self.access.list(limit, page_number).await
    }

    async fn list_all(&self) -> TableResult<Vec<Row>> {
        self.access.list_all().await
    }

    async fn count(&self) -> TableResult<i64> {
        self.access.count().await
    }

    async fn delete(&self, row_id: RowId) -> TableResult<()> {
        warn!(table = self.name(), row_id = row_id, "Refused ledger delete");
        Err(TableError::immutable(self.name(), "delete"))
    }

    async fn update(&self, row_id: RowId, _payload: Payload) -> TableResult<Option<RowId>> {
        warn!(table = self.name(), row_id = row_id, "Refused ledger update");
        Err(TableError::immutable(self.name(), "update"))
    }
}
