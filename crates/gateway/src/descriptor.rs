use pg_tables_models::{Payload, TableError, TableResult};
use serde_json::Value;
use tracing::warn;

use crate::{ColumnCast, Ident};

/// Table name plus its column allow-list ("visibles").
///
/// The allow-list is exhaustive: a column outside it can be neither projected
/// nor written through any table operation, whatever the real schema holds.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    name: Ident,
    visibles: Vec<Ident>,
    casts: Vec<(Ident, ColumnCast)>,
}

impl TableDescriptor {
    pub fn new<I, S>(name: &str, visibles: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = Ident::with_context(name, "table")?;

        let mut columns: Vec<Ident> = Vec::new();
        for column in visibles {
            let column = Ident::with_context(column, "column")?;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }

        if columns.is_empty() {
            return Err(TableError::InvalidPayload {
                table: name.as_str().to_string(),
                reason: "a table needs at least one visible column".to_string(),
            });
        }

        Ok(Self {
            name,
            visibles: columns,
            casts: Vec::new(),
        })
    }

    /// Declare the cast written values of `column` need, e.g. a `TIMESTAMPTZ`
    /// column filled from RFC 3339 strings. Only visible columns take a cast.
    pub fn with_cast(mut self, column: &str, cast: ColumnCast) -> TableResult<Self> {
        let column = self
            .visibles
            .iter()
            .find(|c| *c == column)
            .cloned()
            .ok_or_else(|| TableError::InvalidPayload {
                table: self.name.as_str().to_string(),
                reason: format!("cannot declare a cast for {}: not a visible column", column),
            })?;

        self.casts.retain(|(c, _)| *c != column);
        self.casts.push((column, cast));
        Ok(self)
    }

    pub fn cast_for(&self, column: &Ident) -> Option<ColumnCast> {
        self.casts
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, cast)| *cast)
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn visibles(&self) -> &[Ident] {
        &self.visibles
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visibles.iter().any(|c| c == column)
    }

    /// Comma-separated allow-list, for error messages
    pub fn permitted(&self) -> String {
        self.visibles
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check every payload key against the allow-list.
    ///
    /// Nothing is returned unless every key passes.
    pub fn writable_columns(&self, payload: Payload) -> TableResult<Vec<(Ident, Value)>> {
        let mut pairs = Vec::with_capacity(payload.len());

        for (key, value) in payload {
            let column = self.visibles.iter().find(|c| **c == *key.as_str()).cloned();

            match column {
                Some(column) => pairs.push((column, value)),
                None => {
                    warn!(
                        table = self.name.as_str(),
                        column = %key,
                        "Rejected write to column outside visibles"
                    );
                    return Err(TableError::DisallowedColumn {
                        table: self.name.as_str().to_string(),
                        column: key,
                        permitted: self.permitted(),
                    });
                }
            }
        }

        Ok(pairs)
    }

    /// Check a requested read projection against the allow-list
    pub fn readable_columns<S: AsRef<str>>(&self, columns: &[S]) -> TableResult<Vec<Ident>> {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                self.visibles
                    .iter()
                    .find(|c| *c == column)
                    .cloned()
                    .ok_or_else(|| {
                        warn!(
                            table = self.name.as_str(),
                            column = column,
                            "Rejected read of column outside visibles"
                        );
                        TableError::UnauthorizedColumnAccess {
                            table: self.name.as_str().to_string(),
                            column: column.to_string(),
                        }
                    })
            })
            .collect()
    }
}
