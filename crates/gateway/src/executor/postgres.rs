//! PostgreSQL engine backed by a sqlx pool

use async_trait::async_trait;
use pg_tables_models::{EngineConfig, Row, TableError, TableResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use super::convert::{bind_value, row_to_json, PgQuery};
use super::SqlEngine;
use crate::Statement;

/// PostgreSQL engine
pub struct PgEngine {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgEngine {
    /// Connect a new pool from configuration
    pub async fn connect(config: &EngineConfig) -> TableResult<Self> {
        config.validate()?;
        info!(
            max_connections = config.max_connections,
            "Connecting to PostgreSQL database..."
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.query_timeout))
            .connect(&config.database_url)
            .await
            .map_err(|e| TableError::Connection {
                reason: format!("Failed to connect to PostgreSQL: {}", e),
            })?;

        info!("Connected to PostgreSQL");

        Ok(Self::from_pool(
            pool,
            Duration::from_secs(config.query_timeout),
        ))
    }

    /// Wrap a pool owned by the application
    pub fn from_pool(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Get the underlying database connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn build_query(statement: &Statement) -> PgQuery<'_> {
        let mut query = sqlx::query(statement.sql());
        for value in statement.binds() {
            query = bind_value(query, value.clone());
        }
        query.persistent(false)
    }

    /// Run `fut` under the statement timeout
    async fn with_timeout<T, F>(&self, statement: &Statement, fut: F) -> TableResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        debug!(
            sql = statement.sql(),
            binds = statement.binds().len(),
            "Executing statement"
        );

        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_sqlx_error(e)),
            Err(_) => Err(TableError::Cancelled {
                operation: format!(
                    "{} timed out after {} seconds",
                    statement.verb(),
                    self.query_timeout.as_secs()
                ),
            }),
        }
    }
}

#[async_trait]
impl SqlEngine for PgEngine {
    async fn fetch_all(&self, statement: &Statement) -> TableResult<Vec<Row>> {
        let query = Self::build_query(statement);
        let rows = self
            .with_timeout(statement, query.fetch_all(&self.pool))
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(&self, statement: &Statement) -> TableResult<u64> {
        let query = Self::build_query(statement);
        let result = self
            .with_timeout(statement, query.execute(&self.pool))
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_batch(&self, script: &Statement) -> TableResult<()> {
        if !script.binds().is_empty() {
            return Err(TableError::InvalidPayload {
                table: "batch".to_string(),
                reason: "multi-statement scripts cannot carry bind parameters".to_string(),
            });
        }

        self.with_timeout(script, sqlx::raw_sql(script.sql()).execute(&self.pool))
            .await?;
        Ok(())
    }
}

/// Sort driver errors into connection failures and engine rejections
fn map_sqlx_error(err: sqlx::Error) -> TableError {
    match err {
        sqlx::Error::Database(db_err) => TableError::EngineRejection {
            code: db_err
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            message: db_err.message().to_string(),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => TableError::Connection {
            reason: err.to_string(),
        },
        other => TableError::EngineRejection {
            code: "client".to_string(),
            message: other.to_string(),
        },
    }
}
