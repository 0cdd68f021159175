use async_trait::async_trait;
use pg_tables_gateway::TableDescriptor;
use pg_tables_models::{Payload, Row, RowId, TableResult};

/// Lifecycle half of the table contract, implemented by every variant
#[async_trait]
pub trait Table: Send + Sync {
    fn descriptor(&self) -> &TableDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name().as_str()
    }

    /// Create the table (and anything the variant enforces in the engine)
    async fn create(&self) -> TableResult<()>;

    /// Evolve the schema. Not implemented unless the schema provides it.
    async fn alter(&self) -> TableResult<()>;
}

/// Row operations. Every write is checked against the visible columns before
/// a statement is built; every read projects only visible columns.
#[async_trait]
pub trait RowStore: Table {
    /// Insert a row and return its generated id
    async fn insert(&self, payload: Payload) -> TableResult<RowId>;

    async fn fetch(&self, row_id: RowId) -> TableResult<Option<Row>>;

    /// One page of rows, never more than the table's `max_rows_fetched`
    async fn list(&self, limit: i64, page_number: i64) -> TableResult<Vec<Row>>;

    /// Every row, unbounded. Meant for small administrative tables only;
    /// callers exposing it to untrusted input must bound it themselves.
    async fn list_all(&self) -> TableResult<Vec<Row>>;

    async fn count(&self) -> TableResult<i64>;

    async fn delete(&self, row_id: RowId) -> TableResult<()>;

    /// Update a row, returning its id or `None` if no row matched
    async fn update(&self, row_id: RowId, payload: Payload) -> TableResult<Option<RowId>>;
}
