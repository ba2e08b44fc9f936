//! Outbound HTTP client and Google credentials

use anyhow::{Context, Result};
use folio_core::Config;
use folio_services::{create_token_provider, AccessTokenProvider};
use std::sync::Arc;
use std::time::Duration;

/// Shared client for Document AI, Firestore and the metadata server.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_client_timeout_secs()))
        .build()
        .context("Failed to create HTTP client")
}

pub fn setup_token_provider(
    config: &Config,
    http_client: reqwest::Client,
) -> Arc<dyn AccessTokenProvider> {
    create_token_provider(config, http_client)
}
