use serde::{Deserialize, Serialize};

use crate::{TableError, TableResult, DEFAULT_MAX_ROWS_FETCHED};

/// bcrypt work factor used when nothing else is configured
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest bcrypt work factor a credential table accepts
pub const MIN_BCRYPT_COST: u32 = 10;

/// Engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Per-statement timeout in seconds
    pub query_timeout: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/pg_tables".to_string(),
            max_connections: 10,
            query_timeout: 30,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let max_connections = std::env::var("PG_TABLES_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);

        let query_timeout = std::env::var("PG_TABLES_QUERY_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.query_timeout);

        Self {
            database_url,
            max_connections,
            query_timeout,
        }
    }

    pub fn validate(&self) -> TableResult<()> {
        if self.max_connections == 0 {
            return Err(TableError::Configuration {
                reason: "max_connections must be at least 1".to_string(),
            });
        }
        if self.query_timeout == 0 {
            return Err(TableError::Configuration {
                reason: "query_timeout must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-table settings shared by every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub max_rows_fetched: i64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows_fetched: DEFAULT_MAX_ROWS_FETCHED,
        }
    }
}

impl TableConfig {
    pub fn from_env() -> Self {
        let max_rows_fetched = std::env::var("PG_TABLES_MAX_ROWS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|rows: &i64| *rows > 0)
            .unwrap_or(DEFAULT_MAX_ROWS_FETCHED);

        Self { max_rows_fetched }
    }
}

/// Credential table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Column holding the bcrypt hash
    pub password_column: String,
    /// Column used to look a user up during authentication
    pub identify_by: String,
    pub bcrypt_cost: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            password_column: "password_hash".to_string(),
            identify_by: "username".to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl CredentialConfig {
    pub fn from_env() -> Self {
        let bcrypt_cost = std::env::var("PG_TABLES_BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BCRYPT_COST);

        Self {
            bcrypt_cost,
            ..Self::default()
        }
    }

    /// Identify users by a different column than `username`
    pub fn identified_by(mut self, column: impl Into<String>) -> Self {
        self.identify_by = column.into();
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn validate(&self) -> TableResult<()> {
        // bcrypt itself caps the cost at 31
        if self.bcrypt_cost < MIN_BCRYPT_COST || self.bcrypt_cost > 31 {
            return Err(TableError::Configuration {
                reason: format!(
                    "bcrypt cost must be between {} and 31, got {}",
                    MIN_BCRYPT_COST, self.bcrypt_cost
                ),
            });
        }
        if self.password_column == self.identify_by {
            return Err(TableError::Configuration {
                reason: "password column and identification column must differ".to_string(),
            });
        }
        Ok(())
    }
}
