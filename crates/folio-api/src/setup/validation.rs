//! Startup configuration checks beyond what `Config` parsing enforces

use anyhow::Result;
use folio_core::{ArchiveFailurePolicy, Config};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.http_client_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("HTTP_CLIENT_TIMEOUT_SECS cannot be 0"));
    }

    if config.cors_preflight_enabled()
        && axum::http::HeaderValue::from_str(config.cors_allow_origin()).is_err()
    {
        return Err(anyhow::anyhow!(
            "CORS_ALLOW_ORIGIN is not a valid header value"
        ));
    }

    if config.is_production() && config.cors_allow_origin() == "*" {
        tracing::warn!("CORS allows all origins in production");
    }

    if config.archive_enabled() && config.archive_failure_policy() == ArchiveFailurePolicy::Degrade {
        tracing::warn!(
            "ARCHIVE_FAILURE_POLICY=degrade: records may be stored without an archive reference"
        );
    }

    if config.google_access_token().is_some() && config.is_production() {
        tracing::warn!("Static GOOGLE_ACCESS_TOKEN in production; tokens expire after one hour");
    }

    Ok(())
}
