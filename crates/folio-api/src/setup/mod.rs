//! Application setup and initialization
//!
//! Kept out of main.rs so tests can assemble the router with their own
//! collaborators.

pub mod clients;
pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::services::pipeline::DocumentPipeline;
use crate::state::AppState;
use anyhow::{Context, Result};
use folio_core::Config;
use folio_services::DocumentAiClient;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let http_client = clients::build_http_client(&config)?;
    let token_provider = clients::setup_token_provider(&config, http_client.clone());

    let extractor = Arc::new(DocumentAiClient::from_config(
        &config,
        http_client.clone(),
        token_provider.clone(),
    ));
    tracing::info!(processor = %config.processor_name(), "Document AI client ready");

    let document_store = database::setup_document_store(&config, http_client, token_provider).await?;
    let storage = storage::setup_storage(&config).await?;

    let mut pipeline = DocumentPipeline::new(extractor, document_store.clone());
    if let Some(storage) = storage.clone() {
        pipeline = pipeline.with_archive(storage, config.archive_failure_policy());
    }

    let state = Arc::new(AppState {
        pipeline,
        document_store,
        storage,
        cors_allow_origin: config.cors_allow_origin().to_string(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
