use anyhow::{Context, Result};
use clap::Parser;
use pg_tables::mock::MockEngine;
use pg_tables::{
    ColumnCast, CredentialConfig, CredentialTable, EngineConfig, LedgerTable, MutableTable, PgEngine,
    SqlEngine, TableConfig, TableDescriptor, TableRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod schemas;
use schemas::{AuditLogSchema, NotesSchema, UsersSchema};

/// Create (and optionally alter) the pg-tables demo schema
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// PostgreSQL connection string (falls back to DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Run the alter hooks after creating tables
    #[arg(long)]
    alter: bool,

    /// Print the statements instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Row ceiling for `list`
    #[arg(long)]
    max_rows: Option<i64>,

    /// bcrypt cost for the users table
    #[arg(long)]
    bcrypt_cost: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pg-tables bootstrap");

    let mut table_config = TableConfig::from_env();
    if let Some(max_rows) = args.max_rows {
        table_config.max_rows_fetched = max_rows;
    }

    let mut credential_config = CredentialConfig::from_env();
    if let Some(cost) = args.bcrypt_cost {
        credential_config = credential_config.with_cost(cost);
    }

    if args.dry_run {
        let engine = Arc::new(MockEngine::new());
        let registry = build_registry(engine.clone(), table_config, credential_config).await?;
        run(&registry, args.alter).await?;

        for script in engine.batches() {
            println!("{};\n", script.sql().trim_end());
        }
        return Ok(());
    }

    let mut engine_config = EngineConfig::from_env();
    if let Some(url) = args.database_url {
        engine_config.database_url = url;
    }
    let engine = PgEngine::connect(&engine_config)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let registry = build_registry(Arc::new(engine), table_config, credential_config).await?;
    run(&registry, args.alter).await?;

    info!(tables = ?registry.names(), "Bootstrap complete");
    Ok(())
}

async fn build_registry(
    engine: Arc<dyn SqlEngine>,
    table_config: TableConfig,
    credential_config: CredentialConfig,
) -> Result<TableRegistry> {
    let mut registry = TableRegistry::new(engine);

    let users = CredentialTable::new(
        registry.engine(),
        TableDescriptor::new("users", ["username", "email", "created_at"])?
            .with_cast("created_at", ColumnCast::TimestampTz)?,
        UsersSchema,
        credential_config,
    )
    .await
    .context("Invalid users table configuration")?
    .with_config(table_config.clone());
    registry.register(users);

    registry.register(
        LedgerTable::with_schema(
            registry.engine(),
            TableDescriptor::new("audit_log", ["actor", "action", "details", "recorded_at"])?
                .with_cast("recorded_at", ColumnCast::TimestampTz)?,
            AuditLogSchema,
        )
        .with_config(table_config.clone()),
    );

    registry.register(
        MutableTable::with_schema(
            registry.engine(),
            TableDescriptor::new("notes", ["title", "body"])?,
            NotesSchema,
        )
        .with_config(table_config),
    );

    Ok(registry)
}

async fn run(registry: &TableRegistry, alter: bool) -> Result<()> {
    registry
        .create_tables()
        .await
        .context("Failed to create tables")?;

    if alter {
        registry
            .alter_tables()
            .await
            .context("Failed to alter tables")?;
    }
    Ok(())
}
