use thiserror::Error;

/// Table access errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("{operation} is not implemented for table {table}: provide it in the table schema")]
    NotImplemented { table: String, operation: String },

    #[error("field {column} is not writable on {table}; visible columns are: {permitted}")]
    DisallowedColumn {
        table: String,
        column: String,
        permitted: String,
    },

    #[error("unauthorized access to column {column} on {table}")]
    UnauthorizedColumnAccess { table: String, column: String },

    #[error("weak secret: {reason}")]
    WeakSecret { reason: String },

    #[error("{table} is a ledger: {operation} is not allowed")]
    ImmutabilityViolation { table: String, operation: String },

    #[error("Invalid {context}: {identifier}")]
    InvalidIdentifier { context: String, identifier: String },

    #[error("Invalid payload for {table}: {reason}")]
    InvalidPayload { table: String, reason: String },

    #[error("Password hashing failed: {reason}")]
    Hashing { reason: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Connection error: {reason}")]
    Connection { reason: String },

    #[error("Statement cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Engine rejected statement ({code}): {message}")]
    EngineRejection { code: String, message: String },
}

impl TableError {
    pub fn not_implemented(table: impl Into<String>, operation: impl Into<String>) -> Self {
        TableError::NotImplemented {
            table: table.into(),
            operation: operation.into(),
        }
    }

    pub fn immutable(table: impl Into<String>, operation: impl Into<String>) -> Self {
        TableError::ImmutabilityViolation {
            table: table.into(),
            operation: operation.into(),
        }
    }

    pub fn weak_secret(reason: impl Into<String>) -> Self {
        TableError::WeakSecret {
            reason: reason.into(),
        }
    }

    /// Whether the error was raised before anything reached the engine
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TableError::NotImplemented { .. }
                | TableError::DisallowedColumn { .. }
                | TableError::UnauthorizedColumnAccess { .. }
                | TableError::WeakSecret { .. }
                | TableError::ImmutabilityViolation { .. }
                | TableError::InvalidIdentifier { .. }
                | TableError::InvalidPayload { .. }
        )
    }

    /// Check if a caller could reasonably retry the same call.
    ///
    /// Nothing in this workspace retries on its own; `insert` in particular is
    /// never safe to replay blindly.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TableError::Connection { .. } | TableError::Cancelled { .. }
        )
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self {
            TableError::NotImplemented { .. } => "schema",
            TableError::DisallowedColumn { .. } => "validation",
            TableError::UnauthorizedColumnAccess { .. } => "authorization",
            TableError::WeakSecret { .. } => "credential",
            TableError::ImmutabilityViolation { .. } => "ledger",
            TableError::InvalidIdentifier { .. } => "validation",
            TableError::InvalidPayload { .. } => "validation",
            TableError::Hashing { .. } => "credential",
            TableError::Configuration { .. } => "config",
            TableError::Connection { .. } => "connection",
            TableError::Cancelled { .. } => "connection",
            TableError::EngineRejection { .. } => "engine",
        }
    }
}

/// Result type alias for table operations
pub type TableResult<T> = Result<T, TableError>;
