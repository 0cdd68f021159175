//! Credential table: a mutable table whose rows carry a bcrypt password hash

use async_trait::async_trait;
use pg_tables_gateway::{Ident, SqlEngine, Statement, TableDescriptor};
use pg_tables_models::{
    CredentialConfig, Payload, Row, RowId, TableConfig, TableError, TableResult,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::access::row_id_of;
use crate::password::{hash_password, hash_unchecked, validate_password, verify_password};
use crate::{MutableTable, RowStore, Schema, Table, Unspecified};

/// Payload key carrying the plaintext on insert
pub const PASSWORD_KEY: &str = "password";

// Hashed once per table; only ever compared against, never stored
const DUMMY_SECRET: &str = "pg-tables-dummy-secret";

pub struct CredentialTable<S = Unspecified> {
    table: MutableTable<S>,
    password_column: Ident,
    identify_by: Ident,
    cost: u32,
    dummy_hash: String,
}

impl<S: Schema> CredentialTable<S> {
    /// Build a credential table.
    ///
    /// Fails when the visibles expose the hash column or a `password` column,
    /// or when the configured cost is outside bcrypt's accepted range.
    pub async fn new(
        engine: Arc<dyn SqlEngine>,
        descriptor: TableDescriptor,
        schema: S,
        config: CredentialConfig,
    ) -> TableResult<Self> {
        config.validate()?;

        let password_column = Ident::with_context(config.password_column.as_str(), "password column")?;
        let identify_by = Ident::with_context(config.identify_by.as_str(), "identification column")?;

        for reserved in [password_column.as_str(), PASSWORD_KEY] {
            if descriptor.is_visible(reserved) {
                return Err(TableError::InvalidPayload {
                    table: descriptor.name().as_str().to_string(),
                    reason: format!("{} must not be a visible column of a credential table", reserved),
                });
            }
        }

        let dummy_hash = hash_unchecked(DUMMY_SECRET, config.bcrypt_cost).await?;

        Ok(Self {
            table: MutableTable::with_schema(engine, descriptor, schema),
            password_column,
            identify_by,
            cost: config.bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.table = self.table.with_config(config);
        self
    }

    pub fn password_column(&self) -> &Ident {
        &self.password_column
    }

    pub fn identify_by(&self) -> &Ident {
        &self.identify_by
    }

    /// Hash a new password for an existing row
    pub async fn update_password(&self, row_id: RowId, new_password: &str) -> TableResult<Option<RowId>> {
        let hashed = hash_password(new_password, self.cost).await?;
        let updated = self
            .table
            .update_validated(row_id, vec![(self.password_column.clone(), Value::String(hashed))])
            .await?;

        if updated.is_some() {
            info!(table = self.name(), row_id = row_id, "Password rotated");
        }
        Ok(updated)
    }

    pub async fn verify_password(&self, identifier: &str, plaintext: &str) -> TableResult<bool> {
        Ok(self.authenticate(identifier, plaintext, &[]).await?.is_some())
    }

    /// Id of the matching row when the password verifies
    pub async fn id_after_auth(&self, identifier: &str, plaintext: &str) -> TableResult<Option<RowId>> {
        let row = self.authenticate(identifier, plaintext, &[]).await?;
        Ok(row.and_then(|row| row_id_of(&row, self.table.access().id_column())))
    }

    /// Requested visible columns of the matching row when the password verifies.
    ///
    /// Every column is checked before the lookup runs.
    pub async fn fetch_after_auth<C: AsRef<str>>(
        &self,
        identifier: &str,
        plaintext: &str,
        columns: &[C],
    ) -> TableResult<Option<Row>> {
        let columns = self.descriptor().readable_columns(columns)?;
        let id = self.table.access().id_column();

        let row = self.authenticate(identifier, plaintext, &columns).await?;
        Ok(row.map(|mut row| {
            if !columns.contains(id) {
                row.remove(id.as_str());
            }
            row
        }))
    }

    /// One lookup and exactly one bcrypt verification, whether or not the
    /// identifier exists. Returns the row without its hash on success.
    async fn authenticate(
        &self,
        identifier: &str,
        plaintext: &str,
        columns: &[Ident],
    ) -> TableResult<Option<Row>> {
        let access = self.table.access();
        let id = access.id_column();

        let mut builder = Statement::builder();
        builder.push("SELECT ").push_ident(id);
        for column in columns.iter().filter(|c| *c != id) {
            builder.push(", ").push_ident(column);
        }
        builder
            .push(", ")
            .push_ident(&self.password_column)
            .push(" FROM ")
            .push_ident(access.table())
            .push(" WHERE ")
            .push_ident(&self.identify_by)
            .push(" = ")
            .push_bind(json!(identifier))
            .push("::text LIMIT 1");

        let row = access.engine().fetch_optional(&builder.build()).await?;

        let stored = row
            .as_ref()
            .and_then(|row| row.get(self.password_column.as_str()))
            .and_then(Value::as_str)
            .map(str::to_string);

        match (row, stored) {
            (Some(mut row), Some(stored)) => match verify_password(plaintext, &stored).await {
                Ok(true) => {
                    row.remove(self.password_column.as_str());
                    Ok(Some(row))
                }
                Ok(false) => {
                    warn!(table = self.name(), "Authentication failed");
                    Ok(None)
                }
                Err(TableError::Hashing { reason }) => {
                    // Answer like a wrong password so the identifier stays hidden
                    warn!(table = self.name(), reason = %reason, "Stored password hash is unusable");
                    self.dummy_compare(plaintext).await?;
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            _ => {
                self.dummy_compare(plaintext).await?;
                warn!(table = self.name(), "Authentication failed");
                Ok(None)
            }
        }
    }

    /// Same bcrypt work as a real comparison; the result is discarded
    async fn dummy_compare(&self, plaintext: &str) -> TableResult<()> {
        verify_password(plaintext, &self.dummy_hash).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Schema> Table for CredentialTable<S> {
    fn descriptor(&self) -> &TableDescriptor {
        self.table.descriptor()
    }

    async fn create(&self) -> TableResult<()> {
        self.table.create().await
    }

    async fn alter(&self) -> TableResult<()> {
        self.table.alter().await
    }
}

#[async_trait]
impl<S: Schema> RowStore for CredentialTable<S> {
    /// Takes the plaintext under `password`, stores only its hash
    async fn insert(&self, mut payload: Payload) -> TableResult<RowId> {
        if payload.contains_key(self.password_column.as_str()) {
            return Err(TableError::DisallowedColumn {
                table: self.name().to_string(),
                column: self.password_column.as_str().to_string(),
                permitted: self.descriptor().permitted(),
            });
        }

        let password = match payload.remove(PASSWORD_KEY) {
            Some(Value::String(password)) => password,
            Some(_) => return Err(TableError::weak_secret("password must be a string")),
            None => return Err(TableError::weak_secret("password is required")),
        };
        validate_password(&password)?;

        let mut pairs = self.descriptor().writable_columns(payload)?;
        let hashed = hash_unchecked(&password, self.cost).await?;
        pairs.push((self.password_column.clone(), Value::String(hashed)));

        self.table.insert_validated(pairs).await
    }

    async fn fetch(&self, row_id: RowId) -> TableResult<Option<Row>> {
        self.table.fetch(row_id).await
    }

    async fn list(&self, limit: i64, page_number: i64) -> TableResult<Vec<Row>> {
        self.table.list(limit, page_number).await
    }

    async fn list_all(&self) -> TableResult<Vec<Row>> {
        self.table.list_all().await
    }

    async fn count(&self) -> TableResult<i64> {
        self.table.count().await
    }

    async fn delete(&self, row_id: RowId) -> TableResult<()> {
        self.table.delete(row_id).await
    }

    /// Plain column updates; the hash changes only through `update_password`
    async fn update(&self, row_id: RowId, payload: Payload) -> TableResult<Option<RowId>> {
        self.table.update(row_id, payload).await
    }
}
