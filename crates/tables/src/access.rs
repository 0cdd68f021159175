//! Validated statement paths shared by the mutable and ledger variants

use pg_tables_gateway::{Ident, SqlEngine, Statement, TableDescriptor};
use pg_tables_models::{
    PageWindow, Payload, Row, RowId, TableConfig, TableError, TableResult,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub(crate) struct TableAccess {
    engine: Arc<dyn SqlEngine>,
    descriptor: TableDescriptor,
    config: TableConfig,
    id: Ident,
}

impl TableAccess {
    pub(crate) fn new(engine: Arc<dyn SqlEngine>, descriptor: TableDescriptor) -> Self {
        Self {
            engine,
            descriptor,
            config: TableConfig::default(),
            id: Ident::primary_key(),
        }
    }

    pub(crate) fn set_config(&mut self, config: TableConfig) {
        self.config = config;
    }

    pub(crate) fn config(&self) -> &TableConfig {
        &self.config
    }

    pub(crate) fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub(crate) fn engine(&self) -> &Arc<dyn SqlEngine> {
        &self.engine
    }

    pub(crate) fn table(&self) -> &Ident {
        self.descriptor.name()
    }

    pub(crate) fn id_column(&self) -> &Ident {
        &self.id
    }

    /// Send a DDL script as one batch
    pub(crate) async fn run_script(&self, script: &Statement) -> TableResult<()> {
        self.engine.execute_batch(script).await
    }

    pub(crate) async fn insert(&self, payload: Payload) -> TableResult<RowId> {
        let pairs = self.descriptor.writable_columns(payload)?;
        self.insert_pairs(pairs).await
    }

    /// INSERT already-validated pairs and return the generated id
    pub(crate) async fn insert_pairs(&self, pairs: Vec<(Ident, Value)>) -> TableResult<RowId> {
        let mut builder = Statement::builder();
        builder.push("INSERT INTO ").push_ident(self.table());

        if pairs.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            let casts: Vec<_> = pairs
                .iter()
                .map(|(column, _)| self.descriptor.cast_for(column))
                .collect();
            let (columns, values): (Vec<Ident>, Vec<Value>) = pairs.into_iter().unzip();
            builder
                .push(" (")
                .push_idents(&columns)
                .push(") VALUES (")
                .push_values(values.into_iter().zip(casts))
                .push(")");
        }
        builder.push(" RETURNING ").push_ident(&self.id);

        let rows = self.engine.fetch_all(&builder.build()).await?;
        let row_id = rows
            .first()
            .and_then(|row| row_id_of(row, &self.id))
            .ok_or_else(|| TableError::EngineRejection {
                code: "client".to_string(),
                message: format!("INSERT into {} returned no id", self.table().as_str()),
            })?;

        debug!(table = self.table().as_str(), row_id = row_id, "Inserted row");
        Ok(row_id)
    }

    pub(crate) async fn fetch(&self, row_id: RowId) -> TableResult<Option<Row>> {
        let mut builder = self.select_visibles();
        builder
            .push(" WHERE ")
            .push_ident(&self.id)
            .push(" = ")
            .push_bind(json!(row_id));

        self.engine.fetch_optional(&builder.build()).await
    }

    pub(crate) async fn list(&self, limit: i64, page_number: i64) -> TableResult<Vec<Row>> {
        let window = PageWindow::new(limit, page_number, self.config.max_rows_fetched);

        let mut builder = self.select_visibles();
        builder
            .push(" ORDER BY ")
            .push_ident(&self.id)
            .push(" LIMIT ")
            .push_bind(json!(window.rows_limit))
            .push(" OFFSET ")
            .push_bind(json!(window.rows_offset));

        let mut rows = self.engine.fetch_all(&builder.build()).await?;
        // The engine honours LIMIT; this keeps the ceiling even for engines that don't
        rows.truncate(window.rows_limit as usize);
        Ok(rows)
    }

    pub(crate) async fn list_all(&self) -> TableResult<Vec<Row>> {
        let mut builder = self.select_visibles();
        builder.push(" ORDER BY ").push_ident(&self.id);

        let rows = self.engine.fetch_all(&builder.build()).await?;
        if rows.len() as i64 > self.config.max_rows_fetched {
            debug!(
                table = self.table().as_str(),
                rows = rows.len(),
                "list_all returned more rows than the list ceiling"
            );
        }
        Ok(rows)
    }

    pub(crate) async fn count(&self) -> TableResult<i64> {
        let mut builder = Statement::builder();
        builder
            .push("SELECT COUNT(*) AS ")
            .push_ident(&Ident::new("count")?)
            .push(" FROM ")
            .push_ident(self.table());

        let row = self.engine.fetch_optional(&builder.build()).await?;
        Ok(row
            .and_then(|row| row.get("count").and_then(Value::as_i64))
            .unwrap_or(0))
    }

    pub(crate) async fn delete(&self, row_id: RowId) -> TableResult<()> {
        let mut builder = Statement::builder();
        builder
            .push("DELETE FROM ")
            .push_ident(self.table())
            .push(" WHERE ")
            .push_ident(&self.id)
            .push(" = ")
            .push_bind(json!(row_id));

        let affected = self.engine.execute(&builder.build()).await?;
        debug!(table = self.table().as_str(), row_id = row_id, affected = affected, "Deleted row");
        Ok(())
    }

    pub(crate) async fn update(&self, row_id: RowId, payload: Payload) -> TableResult<Option<RowId>> {
        let pairs = self.descriptor.writable_columns(payload)?;
        self.update_pairs(row_id, pairs).await
    }

    /// UPDATE already-validated pairs on one row
    pub(crate) async fn update_pairs(
        &self,
        row_id: RowId,
        pairs: Vec<(Ident, Value)>,
    ) -> TableResult<Option<RowId>> {
        if pairs.is_empty() {
            return Err(TableError::InvalidPayload {
                table: self.table().as_str().to_string(),
                reason: "UPDATE requires at least one column".to_string(),
            });
        }

        let mut builder = Statement::builder();
        builder
            .push("UPDATE ")
            .push_ident(self.table())
            .push(" SET ")
            .push_assignments(pairs.iter().map(|(column, value)| {
                (column, value.clone(), self.descriptor.cast_for(column))
            }))
            .push(" WHERE ")
            .push_ident(&self.id)
            .push(" = ")
            .push_bind(json!(row_id))
            .push(" RETURNING ")
            .push_ident(&self.id);

        let row = self.engine.fetch_optional(&builder.build()).await?;
        Ok(row.and_then(|row| row_id_of(&row, &self.id)))
    }

    /// `SELECT <visibles> FROM <table>`
    fn select_visibles(&self) -> pg_tables_gateway::StatementBuilder {
        let mut builder = Statement::builder();
        builder
            .push("SELECT ")
            .push_idents(self.descriptor.visibles())
            .push(" FROM ")
            .push_ident(self.table());
        builder
    }
}

pub(crate) fn row_id_of(row: &Row, id: &Ident) -> Option<RowId> {
    row.get(id.as_str()).and_then(Value::as_i64)
}
