// End-to-end scenarios over the recording engine: a registry with one table
// of each kind, driven the way an application would use it.

use pg_tables::mock::MockEngine;
use pg_tables::{
    CredentialConfig, CredentialTable, Ident, LedgerTable, MutableTable, Payload, RowStore,
    Schema, Statement, TableDescriptor, TableError, TableRegistry, TableResult, MIN_BCRYPT_COST,
};
use serde_json::{json, Value};
use std::sync::Arc;

struct Ddl(&'static str);

impl Schema for Ddl {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut builder = Statement::builder();
        builder
            .push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(self.0);
        Ok(builder.build())
    }
}

fn payload(value: Value) -> Payload {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_application_bootstrap() {
    let engine = Arc::new(MockEngine::new());
    let mut registry = TableRegistry::new(engine.clone());

    let users = CredentialTable::new(
        registry.engine(),
        TableDescriptor::new("users", ["username", "email"]).unwrap(),
        Ddl(" (id BIGSERIAL PRIMARY KEY, username TEXT UNIQUE NOT NULL, email TEXT, password_hash TEXT)"),
        CredentialConfig::default().with_cost(MIN_BCRYPT_COST),
    )
    .await
    .unwrap();
    let users = registry.register(users);
    let audit = registry.register(LedgerTable::with_schema(
        registry.engine(),
        TableDescriptor::new("audit_log", ["actor", "action"]).unwrap(),
        Ddl(" (id BIGSERIAL PRIMARY KEY, actor TEXT, action TEXT)"),
    ));
    registry.register(MutableTable::with_schema(
        registry.engine(),
        TableDescriptor::new("notes", ["title"]).unwrap(),
        Ddl(" (id BIGSERIAL PRIMARY KEY, title TEXT)"),
    ));

    registry.create_tables().await.unwrap();
    // users, audit_log + its enforcement, notes
    assert_eq!(engine.batches().len(), 4);
    registry.alter_tables().await.unwrap();
    assert_eq!(engine.batches().len(), 4);

    engine.push_rows(vec![payload(json!({"id": 1}))]);
    let bob = users
        .insert(payload(json!({
            "username": "bob",
            "email": "bob@x.com",
            "password": "secretpw1"
        })))
        .await
        .unwrap();

    engine.push_rows(vec![payload(json!({"id": 1}))]);
    audit
        .insert(payload(json!({"actor": "bob", "action": "signup"})))
        .await
        .unwrap();

    assert!(matches!(
        audit.update(1, payload(json!({"action": "nothing happened"}))).await,
        Err(TableError::ImmutabilityViolation { .. })
    ));
    assert_eq!(bob, 1);
}

#[tokio::test]
async fn test_login_flow() {
    let engine = Arc::new(MockEngine::new());
    let users = CredentialTable::new(
        engine.clone(),
        TableDescriptor::new("users", ["username", "email"]).unwrap(),
        Ddl(""),
        CredentialConfig::default().with_cost(MIN_BCRYPT_COST),
    )
    .await
    .unwrap();

    engine.push_rows(vec![payload(json!({"id": 1}))]);
    users
        .insert(payload(json!({
            "username": "bob",
            "email": "bob@x.com",
            "password": "secretpw1"
        })))
        .await
        .unwrap();

    // Replay the stored hash as the lookup result
    let insert = engine.last_statement().unwrap();
    let stored_hash = insert.binds()[2].clone();
    assert_ne!(stored_hash, json!("secretpw1"));

    let stored = payload(json!({
        "id": 1,
        "email": "bob@x.com",
        "password_hash": stored_hash
    }));

    engine.push_rows(vec![stored.clone()]);
    let row = users
        .fetch_after_auth("bob", "secretpw1", &["email"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Value::Object(row), json!({"email": "bob@x.com"}));

    engine.push_rows(vec![stored]);
    assert!(users
        .fetch_after_auth("bob", "wrongpass", &["email"])
        .await
        .unwrap()
        .is_none());

    // Unknown user: same shape of answer, no error
    assert!(users
        .fetch_after_auth("alice", "secretpw1", &["email"])
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_hostile_identifiers_never_reach_sql() {
    for name in ["users; DROP TABLE users", "x\"y", "robert'); --"] {
        assert!(matches!(
            TableDescriptor::new(name, ["title"]),
            Err(TableError::InvalidIdentifier { .. })
        ));
    }

    let engine = Arc::new(MockEngine::new());
    let notes = MutableTable::new(
        engine.clone(),
        TableDescriptor::new("notes", ["title"]).unwrap(),
    );
    let result = notes
        .insert(payload(json!({"title\" = 'x'; --": "y"})))
        .await;
    assert!(matches!(result, Err(TableError::DisallowedColumn { .. })));
    assert_eq!(engine.round_trips(), 0);
}
