//! JSON <-> PostgreSQL value mapping

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use pg_tables_models::Row;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};

pub(super) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Bind one JSON value with the closest native PostgreSQL type.
///
/// Strings always bind as text; columns that need another type declare a
/// [`crate::ColumnCast`] and the statement casts the placeholder.
pub(super) fn bind_value(query: PgQuery<'_>, value: Value) -> PgQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                // u64 beyond i64 and every float land here
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s),
        Value::Object(_) | Value::Array(_) => query.bind(value),
    }
}

pub(super) fn row_to_json(row: &PgRow) -> Row {
    let mut json_row = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let value = convert_column_value(row, i, column.type_info().name());
        json_row.insert(column.name().to_string(), value);
    }

    json_row
}

fn number(v: i64) -> Value {
    Value::Number(v.into())
}

fn float(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Whole values that fit become integers, the rest floats. Anything f64
/// cannot hold stays exact as a string.
fn decimal_to_json(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return number(i);
        }
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

/// Convert PostgreSQL column value to JSON
fn convert_column_value(row: &PgRow, i: usize, type_name: &str) -> Value {

    let value = match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(i).ok().flatten().map(|v| number(v as i64)),
        "INT4" => row.try_get::<Option<i32>, _>(i).ok().flatten().map(|v| number(v as i64)),
        "INT8" => row.try_get::<Option<i64>, _>(i).ok().flatten().map(number),
        "FLOAT4" => row.try_get::<Option<f32>, _>(i).ok().flatten().map(|v| float(v as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(i).ok().flatten().map(float),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(i)
            .ok()
            .flatten()
            .map(decimal_to_json),
        "BOOL" => row.try_get::<Option<bool>, _>(i).ok().flatten().map(Value::Bool),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%Y-%m-%d").to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(v.format("%H:%M:%S%.f").to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i).ok().flatten(),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::String(base64_engine.encode(v))),
        _ => {
            let fallback = row
                .try_get::<Option<bool>, _>(i)
                .map(|v| v.map(Value::Bool))
                .or_else(|_| row.try_get::<Option<i64>, _>(i).map(|v| v.map(number)))
                .or_else(|_| row.try_get::<Option<f64>, _>(i).map(|v| v.map(float)))
                .or_else(|_| row.try_get::<Option<String>, _>(i).map(|v| v.map(Value::String)))
                .or_else(|_| row.try_get::<Option<Value>, _>(i));
            match fallback {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(type_name = type_name, "Unhandled PostgreSQL type, returning NULL");
                    None
                }
            }
        }
    };

    value.unwrap_or(Value::Null)
}
