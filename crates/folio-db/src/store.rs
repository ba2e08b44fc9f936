use async_trait::async_trait;
use folio_core::models::StructuredRecord;
use folio_core::{Config, DatabaseBackend};
use folio_services::{AccessTokenProvider, AuthError};
use std::sync::Arc;

use crate::firestore::FirestoreDocumentStore;
use crate::postgres::{connect_postgres, PostgresDocumentStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Failed to obtain access token: {0}")]
    Auth(#[from] AuthError),

    #[error("Firestore request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Firestore returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Firestore response: {0}")]
    InvalidResponse(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document database holding processed uploads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a record and return the identifier the database assigned to it.
    async fn insert(&self, record: &StructuredRecord) -> StoreResult<String>;

    /// Cheap round trip used by the readiness probe.
    async fn health_check(&self) -> StoreResult<()>;

    fn backend(&self) -> DatabaseBackend;
}

/// Create the document store selected by `DATABASE_BACKEND`.
///
/// The PostgreSQL backend connects and applies pending migrations before returning.
pub async fn create_document_store(
    config: &Config,
    http_client: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database_backend() {
        DatabaseBackend::Firestore => {
            tracing::info!(
                project_id = %config.firestore_project_id(),
                database = %config.firestore_database(),
                collection = %config.documents_collection(),
                "Initializing Firestore document store"
            );
            Ok(Arc::new(FirestoreDocumentStore::from_config(
                config,
                http_client,
                token_provider,
            )))
        }
        DatabaseBackend::Postgres => {
            tracing::info!(
                table = %config.documents_collection(),
                "Initializing PostgreSQL document store"
            );
            let pool = connect_postgres(config).await?;
            Ok(Arc::new(PostgresDocumentStore::new(
                pool,
                config.documents_collection(),
            )))
        }
    }
}
