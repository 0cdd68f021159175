use pg_tables_models::{TableError, TableResult, ID_COLUMN};
use std::fmt;

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Validate identifier to prevent SQL injection
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_IDENTIFIER_LEN`] bytes.
pub fn validate_identifier(identifier: &str, context: &str) -> TableResult<()> {
    let invalid = || TableError::InvalidIdentifier {
        context: context.to_string(),
        identifier: identifier.to_string(),
    };

    if identifier.is_empty() || identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid());
    }

    let mut chars = identifier.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid());
    }

    Ok(())
}

/// A validated SQL identifier.
///
/// The only way table and column names enter a [`crate::Statement`]. Renders
/// double-quoted, so reserved words such as `user` or `order` are safe too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> TableResult<Self> {
        let name = name.into();
        validate_identifier(&name, "identifier")?;
        Ok(Self(name))
    }

    /// Like [`Ident::new`] but reports `context` (e.g. "column") on failure
    pub fn with_context(name: impl Into<String>, context: &str) -> TableResult<Self> {
        let name = name.into();
        validate_identifier(&name, context)?;
        Ok(Self(name))
    }

    /// The `id` primary key column every managed table carries
    pub fn primary_key() -> Self {
        Self(ID_COLUMN.to_string())
    }

    /// Name for an object that belongs to `base`, e.g. `audit_log_no_update`
    pub fn derived(base: &Ident, suffix: &str) -> TableResult<Self> {
        Self::with_context(format!("{}{}", base.0, suffix), "derived identifier")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form suitable for splicing into SQL text
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["users", "agent_results", "job_123", "_private", "Email"] {
            assert!(Ident::new(name).is_ok(), "{} should be accepted", name);
        }
    }

    #[test]
    fn test_injection_patterns_are_rejected() {
        let malicious_inputs = [
            "users; DROP TABLE users",
            "users--",
            "id' OR '1'='1",
            "\"users\"",
            "a b",
            "1users",
            "",
            "users/*",
            "naïve",
        ];

        for input in malicious_inputs {
            assert!(
                matches!(
                    Ident::with_context(input, "column"),
                    Err(TableError::InvalidIdentifier { .. })
                ),
                "Input '{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_length_limit() {
        let max = "a".repeat(MAX_IDENTIFIER_LEN);
        assert!(Ident::new(max.clone()).is_ok());
        assert!(Ident::new(format!("{}a", max)).is_err());
    }

    #[test]
    fn test_derived_names_are_validated() {
        let base = Ident::new("a".repeat(60)).unwrap();
        assert!(Ident::derived(&base, "_no_update").is_err());

        let base = Ident::new("audit_log").unwrap();
        let derived = Ident::derived(&base, "_no_update").unwrap();
        assert_eq!(derived.as_str(), "audit_log_no_update");
    }

    #[test]
    fn test_rendering_is_quoted() {
        let ident = Ident::new("user").unwrap();
        assert_eq!(ident.to_string(), "\"user\"");
    }
}
