//! Engine-side immutability for ledger tables
//!
//! Two layers are installed on the table. Row-level security is enabled and
//! forced, with permissive SELECT/INSERT policies and restrictive UPDATE and
//! DELETE policies that match nothing. Statement-level triggers then raise on
//! any UPDATE, DELETE or TRUNCATE, including statements that would match zero
//! rows and sessions running with `session_replication_role = replica`.

use pg_tables_gateway::{Ident, Statement};
use pg_tables_models::{TableError, TableResult};

/// Names of every object the enforcement script owns
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EnforcementObjects {
    pub select_policy: Ident,
    pub insert_policy: Ident,
    pub update_policy: Ident,
    pub delete_policy: Ident,
    pub function: Ident,
    pub update_trigger: Ident,
    pub delete_trigger: Ident,
    pub truncate_trigger: Ident,
}

impl EnforcementObjects {
    pub(crate) fn for_table(table: &Ident) -> TableResult<Self> {
        Ok(Self {
            select_policy: Ident::derived(table, "_allow_select")?,
            insert_policy: Ident::derived(table, "_allow_insert")?,
            update_policy: Ident::derived(table, "_no_update")?,
            delete_policy: Ident::derived(table, "_no_delete")?,
            function: Ident::derived(table, "_immutable")?,
            update_trigger: Ident::derived(table, "_block_update")?,
            delete_trigger: Ident::derived(table, "_block_delete")?,
            truncate_trigger: Ident::derived(table, "_block_truncate")?,
        })
    }
}

/// The whole enforcement batch. Every object is dropped or replaced before it
/// is created, so the script can run again on an enforced table.
pub(crate) fn enforcement_script(table: &Ident) -> TableResult<Statement> {
    let objects = EnforcementObjects::for_table(table)?;
    let mut sql = Statement::builder();

    sql.push("ALTER TABLE ").push_ident(table).push(" ENABLE ROW LEVEL SECURITY;\n");
    sql.push("ALTER TABLE ").push_ident(table).push(" FORCE ROW LEVEL SECURITY;\n");

    let policies = [
        (&objects.select_policy, " AS PERMISSIVE FOR SELECT USING (true);\n"),
        (&objects.insert_policy, " AS PERMISSIVE FOR INSERT WITH CHECK (true);\n"),
        (
            &objects.update_policy,
            " AS RESTRICTIVE FOR UPDATE USING (false) WITH CHECK (false);\n",
        ),
        (&objects.delete_policy, " AS RESTRICTIVE FOR DELETE USING (false);\n"),
    ];
    for (policy, clause) in policies {
        sql.push("DROP POLICY IF EXISTS ")
            .push_ident(policy)
            .push(" ON ")
            .push_ident(table)
            .push(";\n");
        sql.push("CREATE POLICY ")
            .push_ident(policy)
            .push(" ON ")
            .push_ident(table)
            .push(clause);
    }

    sql.push("CREATE OR REPLACE FUNCTION ")
        .push_ident(&objects.function)
        .push(
            "() RETURNS trigger LANGUAGE plpgsql AS $$\n\
             BEGIN\n\
             \x20 RAISE EXCEPTION 'ledger table % is append-only: % is not allowed', TG_TABLE_NAME, TG_OP\n\
             \x20   USING ERRCODE = 'insufficient_privilege';\n\
             END;\n\
             $$;\n",
        );

    let triggers = [
        (&objects.update_trigger, " BEFORE UPDATE ON "),
        (&objects.delete_trigger, " BEFORE DELETE ON "),
        (&objects.truncate_trigger, " BEFORE TRUNCATE ON "),
    ];
    for (trigger, event) in triggers {
        sql.push("DROP TRIGGER IF EXISTS ")
            .push_ident(trigger)
            .push(" ON ")
            .push_ident(table)
            .push(";\n");
        sql.push("CREATE TRIGGER ")
            .push_ident(trigger)
            .push(event)
            .push_ident(table)
            .push(" FOR EACH STATEMENT EXECUTE FUNCTION ")
            .push_ident(&objects.function)
            .push("();\n");
        sql.push("ALTER TABLE ")
            .push_ident(table)
            .push(" ENABLE ALWAYS TRIGGER ")
            .push_ident(trigger)
            .push(";\n");
    }

    sql.push("REVOKE TRUNCATE ON ").push_ident(table).push(" FROM PUBLIC;\n");

    Ok(sql.build())
}

const FORBIDDEN_IN_ALTER: &[&str] = &[
    "DISABLE ROW LEVEL SECURITY",
    "NO FORCE ROW LEVEL SECURITY",
    "DISABLE TRIGGER",
    "ENABLE REPLICA TRIGGER",
    "DROP POLICY",
    "ALTER POLICY",
    "DROP TRIGGER",
    "DROP FUNCTION",
    "DROP TABLE",
    "GRANT TRUNCATE",
    "SESSION_REPLICATION_ROLE",
];

/// Refuse a ledger alter script that would weaken enforcement
pub(crate) fn guard_alter(table: &Ident, script: &Statement) -> TableResult<()> {
    let normalized = script
        .sql()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();

    match FORBIDDEN_IN_ALTER.iter().find(|phrase| normalized.contains(*phrase)) {
        Some(phrase) => Err(TableError::immutable(
            table.as_str(),
            format!("alter containing {}", phrase),
        )),
        None => Ok(()),
    }
}
