use pg_tables_gateway::SqlEngine;
use pg_tables_models::{TableError, TableResult};
use std::sync::Arc;
use tracing::{debug, info};

use crate::Table;

/// Shared engine handle plus the tables built on it, in registration order
pub struct TableRegistry {
    engine: Arc<dyn SqlEngine>,
    tables: Vec<Arc<dyn Table>>,
}

impl TableRegistry {
    pub fn new(engine: Arc<dyn SqlEngine>) -> Self {
        Self {
            engine,
            tables: Vec::new(),
        }
    }

    /// Engine handle to construct tables with
    pub fn engine(&self) -> Arc<dyn SqlEngine> {
        self.engine.clone()
    }

    /// Register a table and get a typed handle back.
    ///
    /// A table with the same name replaces the earlier one in its position.
    pub fn register<T: Table + 'static>(&mut self, table: T) -> Arc<T> {
        let table = Arc::new(table);
        let entry: Arc<dyn Table> = table.clone();

        match self.tables.iter().position(|t| t.name() == entry.name()) {
            Some(index) => {
                debug!(table = entry.name(), "Replacing registered table");
                self.tables[index] = entry;
            }
            None => self.tables.push(entry),
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Create every table in order, stopping at the first failure
    pub async fn create_tables(&self) -> TableResult<()> {
        for table in &self.tables {
            table.create().await?;
        }
        info!(tables = self.tables.len(), "All tables created");
        Ok(())
    }

    /// Alter every table in order. Tables without an alter hook are skipped.
    pub async fn alter_tables(&self) -> TableResult<()> {
        let mut altered = 0;
        for table in &self.tables {
            match table.alter().await {
                Ok(()) => altered += 1,
                Err(TableError::NotImplemented { .. }) => {
                    debug!(table = table.name(), "No alter hook, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        info!(altered = altered, "Tables altered");
        Ok(())
    }
}
