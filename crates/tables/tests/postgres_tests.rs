// Tests against a live PostgreSQL instance.
// Each test returns early when DATABASE_URL is not set.

use pg_tables::{
    ColumnCast, CredentialConfig, CredentialTable, EngineConfig, Ident, LedgerTable, MutableTable, PgEngine,
    RowStore, Schema, SqlEngine, Statement, Table, TableDescriptor, TableError, TableResult,
    MIN_BCRYPT_COST,
};
use serde_json::{json, Value};
use std::sync::Arc;

async fn setup_engine() -> Option<Arc<PgEngine>> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        }
    };

    let config = EngineConfig {
        database_url,
        max_connections: 2,
        query_timeout: 10,
    };
    let engine = PgEngine::connect(&config)
        .await
        .expect("Failed to connect to test database");
    Some(Arc::new(engine))
}

fn unique_name(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}_{}_{}", prefix, std::process::id(), nanos)
}

fn payload(value: Value) -> pg_tables::Payload {
    value.as_object().cloned().unwrap()
}

async fn drop_table(engine: &PgEngine, table: &str, function: Option<&str>) {
    sqlx::raw_sql(&format!("DROP TABLE IF EXISTS \"{}\" CASCADE", table))
        .execute(engine.pool())
        .await
        .expect("Failed to drop test table");
    if let Some(function) = function {
        sqlx::raw_sql(&format!("DROP FUNCTION IF EXISTS \"{}\"()", function))
            .execute(engine.pool())
            .await
            .expect("Failed to drop test function");
    }
}

struct Events;

impl Schema for Events {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut builder = Statement::builder();
        builder
            .push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(" (id BIGSERIAL PRIMARY KEY, event TEXT NOT NULL, amount BIGINT, created_at TIMESTAMPTZ NOT NULL DEFAULT now())");
        Ok(builder.build())
    }
}

struct Users;

impl Schema for Users {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut builder = Statement::builder();
        builder
            .push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(" (id BIGSERIAL PRIMARY KEY, username TEXT UNIQUE NOT NULL, email TEXT, password_hash TEXT)");
        Ok(builder.build())
    }
}

struct Measurements;

impl Schema for Measurements {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut builder = Statement::builder();
        builder
            .push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(" (id BIGSERIAL PRIMARY KEY, note TEXT, amount BIGINT, price NUMERIC(10,2), happened_at TIMESTAMPTZ)");
        Ok(builder.build())
    }
}

#[tokio::test]
async fn test_ledger_refuses_direct_sql() {
    let Some(engine) = setup_engine().await else {
        return;
    };
    let name = unique_name("ledger");
    let descriptor = TableDescriptor::new(name.as_str(), ["event", "amount"]).unwrap();
    let ledger = LedgerTable::with_schema(engine.clone(), descriptor, Events);

    ledger.create().await.unwrap();
    // running create again must not fail on existing policies or triggers
    ledger.create().await.unwrap();

    let id = ledger
        .insert(payload(json!({"event": "deposit", "amount": 10})))
        .await
        .unwrap();
    let row = ledger.fetch(id).await.unwrap().unwrap();
    assert_eq!(row["amount"], json!(10));

    let table = Ident::new(name.as_str()).unwrap();
    for verb in ["update", "delete", "truncate"] {
        let mut builder = Statement::builder();
        match verb {
            "update" => builder
                .push("UPDATE ")
                .push_ident(&table)
                .push(" SET amount = 0"),
            "delete" => builder.push("DELETE FROM ").push_ident(&table),
            _ => builder.push("TRUNCATE ").push_ident(&table),
        };
        let result = engine.execute(&builder.build()).await;
        assert!(
            matches!(result, Err(TableError::EngineRejection { .. })),
            "direct {} should be refused, got {:?}",
            verb,
            result
        );
    }

    assert_eq!(ledger.count().await.unwrap(), 1);
    assert!(matches!(
        ledger.delete(id).await,
        Err(TableError::ImmutabilityViolation { .. })
    ));

    drop_table(&engine, &name, Some(&format!("{}_immutable", name))).await;
}

#[tokio::test]
async fn test_credential_round_trip() {
    let Some(engine) = setup_engine().await else {
        return;
    };
    let name = unique_name("users");
    let descriptor = TableDescriptor::new(name.as_str(), ["username", "email"]).unwrap();
    let users = CredentialTable::new(
        engine.clone(),
        descriptor,
        Users,
        CredentialConfig::default().with_cost(MIN_BCRYPT_COST),
    )
    .await
    .unwrap();
    users.create().await.unwrap();

    let id = users
        .insert(payload(json!({
            "username": "bob",
            "email": "bob@x.com",
            "password": "secretpw1"
        })))
        .await
        .unwrap();

    let table = Ident::new(name.as_str()).unwrap();
    let mut builder = Statement::builder();
    builder
        .push("SELECT password_hash FROM ")
        .push_ident(&table)
        .push(" WHERE id = ")
        .push_bind(json!(id));
    let stored = engine.fetch_optional(&builder.build()).await.unwrap().unwrap();
    assert_ne!(stored["password_hash"], json!("secretpw1"));

    let row = users
        .fetch_after_auth("bob", "secretpw1", &["email"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Value::Object(row), json!({"email": "bob@x.com"}));

    assert!(users
        .fetch_after_auth("bob", "wrongpass", &["email"])
        .await
        .unwrap()
        .is_none());
    assert!(!users.verify_password("nobody", "secretpw1").await.unwrap());
    assert_eq!(users.id_after_auth("bob", "secretpw1").await.unwrap(), Some(id));

    users.update_password(id, "rotated-pw").await.unwrap();
    assert!(!users.verify_password("bob", "secretpw1").await.unwrap());
    assert!(users.verify_password("bob", "rotated-pw").await.unwrap());

    let fetched = users.fetch(id).await.unwrap().unwrap();
    assert!(!fetched.contains_key("password_hash"));

    drop_table(&engine, &name, None).await;
}

#[tokio::test]
async fn test_mutable_crud_and_paging() {
    let Some(engine) = setup_engine().await else {
        return;
    };
    let name = unique_name("notes");
    let descriptor = TableDescriptor::new(name.as_str(), ["event", "amount"]).unwrap();
    let notes = MutableTable::with_schema(engine.clone(), descriptor, Events);
    notes.create().await.unwrap();

    for amount in 0..7 {
        notes
            .insert(payload(json!({"event": "n", "amount": amount})))
            .await
            .unwrap();
    }

    let page = notes.list(3, 1).await.unwrap();
    let amounts: Vec<i64> = page.iter().filter_map(|r| r["amount"].as_i64()).collect();
    assert_eq!(amounts, vec![3, 4, 5]);
    assert_eq!(notes.list_all().await.unwrap().len(), 7);

    let first = notes.list(1, 0).await.unwrap();
    let row_count = notes.count().await.unwrap();
    assert_eq!(row_count, 7);
    assert_eq!(first.len(), 1);

    let mut builder = Statement::builder();
    builder.push("SELECT MIN(id) AS id FROM ").push_ident(&Ident::new(name.as_str()).unwrap());
    let min = engine.fetch_optional(&builder.build()).await.unwrap().unwrap();
    let min_id = min["id"].as_i64().unwrap();

    assert_eq!(
        notes.update(min_id, payload(json!({"amount": 100}))).await.unwrap(),
        Some(min_id)
    );
    assert_eq!(
        notes.update(-1, payload(json!({"amount": 100}))).await.unwrap(),
        None
    );
    notes.delete(min_id).await.unwrap();
    assert!(notes.fetch(min_id).await.unwrap().is_none());

    drop_table(&engine, &name, None).await;
}

#[tokio::test]
async fn test_column_values_round_trip() {
    let Some(engine) = setup_engine().await else {
        return;
    };
    let name = unique_name("measurements");
    let descriptor = TableDescriptor::new(name.as_str(), ["note", "amount", "price", "happened_at"])
        .unwrap()
        .with_cast("price", ColumnCast::Numeric)
        .unwrap()
        .with_cast("happened_at", ColumnCast::TimestampTz)
        .unwrap();
    let table = MutableTable::with_schema(engine.clone(), descriptor, Measurements);
    table.create().await.unwrap();

    let id = table
        .insert(payload(json!({
            "note": "2024-01-01T10:00:00",
            "amount": null,
            "price": 12.5,
            "happened_at": "2024-01-01T10:00:00Z"
        })))
        .await
        .unwrap();

    let row = table.fetch(id).await.unwrap().unwrap();
    assert_eq!(row["note"], json!("2024-01-01T10:00:00"));
    assert_eq!(row["amount"], Value::Null);
    assert_eq!(row["price"], json!(12.5));
    assert!(row["happened_at"].is_string());

    table
        .update(id, payload(json!({"amount": 7, "price": "3.10"})))
        .await
        .unwrap();
    let row = table.fetch(id).await.unwrap().unwrap();
    assert_eq!(row["amount"], json!(7));
    assert_eq!(row["price"], json!(3.1));

    table
        .update(id, payload(json!({"amount": null, "happened_at": null})))
        .await
        .unwrap();
    let row = table.fetch(id).await.unwrap().unwrap();
    assert_eq!(row["amount"], Value::Null);
    assert_eq!(row["happened_at"], Value::Null);

    drop_table(&engine, &name, None).await;
}

#[tokio::test]
async fn test_timestamp_like_username_authenticates() {
    let Some(engine) = setup_engine().await else {
        return;
    };
    let name = unique_name("users");
    let descriptor = TableDescriptor::new(name.as_str(), ["username", "email"]).unwrap();
    let users = CredentialTable::new(
        engine.clone(),
        descriptor,
        Users,
        CredentialConfig::default().with_cost(MIN_BCRYPT_COST),
    )
    .await
    .unwrap();
    users.create().await.unwrap();

    users
        .insert(payload(json!({
            "username": "2024-01-01T10:00:00",
            "password": "secretpw1"
        })))
        .await
        .unwrap();

    assert!(users
        .verify_password("2024-01-01T10:00:00", "secretpw1")
        .await
        .unwrap());
    assert!(!users
        .verify_password("2024-01-01T10:00:00", "wrongpass")
        .await
        .unwrap());
    assert!(!users
        .verify_password("2025-06-30", "secretpw1")
        .await
        .unwrap());

    drop_table(&engine, &name, None).await;
}
