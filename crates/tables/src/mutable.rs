//! Mutable resource table

use async_trait::async_trait;
use pg_tables_gateway::{Ident, SqlEngine, TableDescriptor};
use pg_tables_models::{Payload, Row, RowId, TableConfig, TableResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::access::TableAccess;
use crate::{RowStore, Schema, Table, Unspecified};

/// Full CRUD over the descriptor's visible columns
pub struct MutableTable<S = Unspecified> {
    access: TableAccess,
    schema: S,
}

impl MutableTable<Unspecified> {
    /// A table with no DDL; `create`/`alter` report `NotImplemented`
    pub fn new(engine: Arc<dyn SqlEngine>, descriptor: TableDescriptor) -> Self {
        Self::with_schema(engine, descriptor, Unspecified)
    }
}

impl<S: Schema> MutableTable<S> {
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

    pub fn config(&self) -> &TableConfig {
        self.access.config()
    }

    pub(crate) fn access(&self) -> &TableAccess {
        &self.access
    }

    pub(crate) async fn insert_validated(&self, pairs: Vec<(Ident, Value)>) -> TableResult<RowId> {
        self.access.insert_pairs(pairs).await
    }

    pub(crate) async fn update_validated(
        &self,
        row_id: RowId,
        pairs: Vec<(Ident, Value)>,
    ) -> TableResult<Option<RowId>> {
        self.access.update_pairs(row_id, pairs).await
    }
}

#[async_trait]
impl<S: Schema> Table for MutableTable<S> {
    fn descriptor(&self) -> &TableDescriptor {
        self.access.descriptor()
    }

    async fn create(&self) -> TableResult<()> {
        let script = self.schema.create_table(self.access.table())?;
        self.access.run_script(&script).await?;
        info!(table = self.name(), "Created table");
        Ok(())
    }

    async fn alter(&self) -> TableResult<()> {
        let script = self.schema.alter_table(self.access.table())?;
        self.access.run_script(&script).await?;
        info!(table = self.name(), "Altered table");
        Ok(())
    }
}

#[async_trait]
impl<S: Schema> RowStore for MutableTable<S> {
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
        self.access.delete(row_id).await
    }

    async fn update(&self, row_id: RowId, payload: Payload) -> TableResult<Option<RowId>> {
        self.access.update(row_id, payload).await
    }
}
