// Password hashing and validation module

use bcrypt::{hash, verify};
use pg_tables_models::{TableError, TableResult};

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bcrypt has a 72-byte limit)
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Validate password meets the length policy.
///
/// Error reasons describe the rule only, never the password itself.
pub fn validate_password(password: &str) -> TableResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(TableError::weak_secret(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(TableError::weak_secret(format!(
            "Password must be at most {} bytes long",
            MAX_PASSWORD_LENGTH
        )));
    }

    Ok(())
}

/// Validate then hash a password with bcrypt.
///
/// Runs on the blocking thread pool; policy violations return before any
/// hashing work starts.
pub async fn hash_password(password: &str, cost: u32) -> TableResult<String> {
    validate_password(password)?;
    hash_unchecked(password, cost).await
}

/// Hash without the length policy. Only used for the dummy hash.
pub(crate) async fn hash_unchecked(password: &str, cost: u32) -> TableResult<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| TableError::Hashing {
            reason: e.to_string(),
        })
    })
    .await
    .map_err(|e| TableError::Hashing {
        reason: format!("Task join error: {}", e),
    })?
}

/// Verify a password against a bcrypt hash.
///
/// The comparison is bcrypt's own; a malformed stored hash is reported
/// without echoing the hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> TableResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &stored_hash).map_err(|_| TableError::Hashing {
            reason: "stored password hash is malformed".to_string(),
        })
    })
    .await
    .map_err(|e| TableError::Hashing {
        reason: format!("Task join error: {}", e),
    })?
}
