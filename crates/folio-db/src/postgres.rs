//! PostgreSQL document store

use anyhow::{Context, Result};
use async_trait::async_trait;
use folio_core::models::StructuredRecord;
use folio_core::{Config, DatabaseBackend};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::store::{DocumentStore, StoreResult};

/// Connect the pool and run pending migrations.
pub async fn connect_postgres(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set for the postgres backend")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    insert_sql: String,
}

impl PostgresDocumentStore {
    /// `table` must be a plain SQL identifier; configuration validation guarantees this.
    pub fn new(pool: PgPool, table: &str) -> Self {
        let insert_sql = format!(
            "INSERT INTO {} (id, timestamp, content, user_id, mimetype, raw_bytes, storage_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            table
        );
        Self { pool, insert_sql }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "postgresql",
        db.operation = "insert",
        archived = record.is_archived()
    ))]
    async fn insert(&self, record: &StructuredRecord) -> StoreResult<String> {
        let id = Uuid::new_v4();

        sqlx::query(&self.insert_sql)
            .bind(id)
            .bind(record.timestamp)
            .bind(&record.content)
            .bind(record.user_id.as_deref())
            .bind(&record.mimetype)
            .bind(record.raw_bytes().map(|b| b.as_ref()))
            .bind(record.storage_url())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to insert document record");
                e
            })?;

        Ok(id.to_string())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }
}
