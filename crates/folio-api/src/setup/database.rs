//! Document store setup

use anyhow::{Context, Result};
use folio_core::Config;
use folio_db::{create_document_store, DocumentStore};
use folio_services::AccessTokenProvider;
use std::sync::Arc;

pub async fn setup_document_store(
    config: &Config,
    http_client: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
) -> Result<Arc<dyn DocumentStore>> {
    let store = create_document_store(config, http_client, token_provider)
        .await
        .context("Failed to initialize document store")?;

    tracing::info!(
        backend = %store.backend(),
        collection = %config.documents_collection(),
        "Document store initialized"
    );

    Ok(store)
}
