//! Google OAuth access tokens for the Document AI and Firestore REST APIs.
//!
//! Tokens come either from a fixed `GOOGLE_ACCESS_TOKEN` or from the GCE/Cloud
//! Run metadata server, which issues short-lived tokens for the attached
//! service account.

use async_trait::async_trait;
use folio_core::Config;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tokens are refreshed this long before the metadata server says they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Metadata server request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Metadata server returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Source of bearer tokens for Google REST APIs.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> AuthResult<String>;
}

/// A fixed token, typically from `gcloud auth print-access-token` during local development.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> AuthResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Fetches service-account tokens from the metadata server and caches them
/// until shortly before expiry.
pub struct MetadataServerTokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl Debug for MetadataServerTokenProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MetadataServerTokenProvider")
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl MetadataServerTokenProvider {
    /// `host` is a `host[:port]` pair such as `metadata.google.internal`.
    pub fn new(http_client: reqwest::Client, host: &str) -> Self {
        Self {
            http_client,
            token_url: format!("http://{}{}", host, METADATA_TOKEN_PATH),
            cache: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> AuthResult<MetadataTokenResponse> {
        let response = self
            .http_client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AccessTokenProvider for MetadataServerTokenProvider {
    async fn access_token(&self) -> AuthResult<String> {
        // Held across the fetch so concurrent requests share one refresh
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        let fetched = self.fetch().await?;
        let lifetime = Duration::from_secs(fetched.expires_in).saturating_sub(REFRESH_MARGIN);
        tracing::debug!(
            expires_in_secs = fetched.expires_in,
            "Fetched access token from metadata server"
        );

        *cache = Some(CachedToken {
            token: fetched.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(fetched.access_token)
    }
}

/// Pick the token source: an explicit `GOOGLE_ACCESS_TOKEN` wins, otherwise the metadata server.
pub fn create_token_provider(
    config: &Config,
    http_client: reqwest::Client,
) -> Arc<dyn AccessTokenProvider> {
    match config.google_access_token() {
        Some(token) => {
            tracing::info!("Using static Google access token");
            Arc::new(StaticTokenProvider::new(token))
        }
        None => {
            tracing::info!(
                host = %config.gce_metadata_host(),
                "Using metadata server for Google access tokens"
            );
            Arc::new(MetadataServerTokenProvider::new(
                http_client,
                config.gce_metadata_host(),
            ))
        }
    }
}
