//! Statement composition

use serde_json::Value;

use crate::Ident;

/// Explicit cast for a column whose values arrive as JSON strings or numbers.
///
/// Binds are typed from the JSON value (strings as text), so columns such as
/// `TIMESTAMPTZ` or `UUID` need the placeholder cast to accept them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCast {
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Uuid,
    Numeric,
}

impl ColumnCast {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnCast::Timestamp => "::timestamp",
            ColumnCast::TimestampTz => "::timestamptz",
            ColumnCast::Date => "::date",
            ColumnCast::Time => "::time",
            ColumnCast::Uuid => "::uuid",
            ColumnCast::Numeric => "::numeric",
        }
    }
}

/// SQL text plus its bind values, ready for an engine
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    binds: Vec<Value>,
}

impl Statement {
    pub fn builder() -> StatementBuilder {
        StatementBuilder::new()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[Value] {
        &self.binds
    }

    /// Leading keyword, used for logging and cancellation messages
    pub fn verb(&self) -> &str {
        self.sql.split_whitespace().next().unwrap_or("")
    }
}

/// Builds a [`Statement`] from static SQL fragments, identifiers and binds.
///
/// Free text is restricted to `&'static str`, so caller data can only reach
/// the SQL through [`Ident`] (validated and quoted) or as a `$n` parameter.
#[derive(Debug, Default)]
pub struct StatementBuilder {
    sql: String,
    binds: Vec<Value>,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &'static str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        self.sql.push_str(&ident.quoted());
        self
    }

    /// Comma-separated identifier list
    pub fn push_idents<'a, I>(&mut self, idents: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Ident>,
    {
        for (i, ident) in idents.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.sql.push_str(&ident.quoted());
        }
        self
    }

    pub fn push_bind(&mut self, value: Value) -> &mut Self {
        self.binds.push(value);
        self.sql.push_str(&format!("${}", self.binds.len()));
        self
    }

    /// Bind a column value, with the column's declared cast.
    ///
    /// JSON null is written as a literal `NULL` so the engine types it from
    /// the target column instead of from the bind.
    pub fn push_value(&mut self, value: Value, cast: Option<ColumnCast>) -> &mut Self {
        if value.is_null() {
            return self.push("NULL");
        }
        self.push_bind(value);
        if let Some(cast) = cast {
            self.push(cast.as_sql());
        }
        self
    }

    /// Comma-separated value list for INSERT ... VALUES
    pub fn push_values<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (Value, Option<ColumnCast>)>,
    {
        for (i, (value, cast)) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_value(value, cast);
        }
        self
    }

    /// `"col_a" = $n, "col_b" = $m` for UPDATE ... SET
    pub fn push_assignments<'a, I>(&mut self, assignments: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a Ident, Value, Option<ColumnCast>)>,
    {
        for (i, (column, value, cast)) in assignments.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_ident(column).push(" = ").push_value(value, cast);
        }
        self
    }

    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            binds: self.binds,
        }
    }
}
