//! DDL for the tables the bootstrap registers

use pg_tables::{Ident, Schema, Statement, TableResult};

pub struct UsersSchema;

impl Schema for UsersSchema {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut sql = Statement::builder();
        sql.push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(
                " (\n\
                 \x20   id BIGSERIAL PRIMARY KEY,\n\
                 \x20   username TEXT NOT NULL UNIQUE,\n\
                 \x20   email TEXT,\n\
                 \x20   password_hash TEXT NOT NULL,\n\
                 \x20   created_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
                 )",
            );
        Ok(sql.build())
    }
}

pub struct AuditLogSchema;

impl Schema for AuditLogSchema {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut sql = Statement::builder();
        sql.push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(
                " (\n\
                 \x20   id BIGSERIAL PRIMARY KEY,\n\
                 \x20   actor TEXT NOT NULL,\n\
                 \x20   action TEXT NOT NULL,\n\
                 \x20   details JSONB,\n\
                 \x20   recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
                 )",
            );
        Ok(sql.build())
    }

    fn alter_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut sql = Statement::builder();
        sql.push("ALTER TABLE ")
            .push_ident(table)
            .push(" ADD COLUMN IF NOT EXISTS source TEXT");
        Ok(sql.build())
    }
}

pub struct NotesSchema;

impl Schema for NotesSchema {
    fn create_table(&self, table: &Ident) -> TableResult<Statement> {
        let mut sql = Statement::builder();
        sql.push("CREATE TABLE IF NOT EXISTS ")
            .push_ident(table)
            .push(
                " (\n\
                 \x20   id BIGSERIAL PRIMARY KEY,\n\
                 \x20   title TEXT NOT NULL,\n\
                 \x20   body TEXT\n\
                 )",
            );
        Ok(sql.build())
    }
}
