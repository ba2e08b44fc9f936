//! Archival storage setup

use anyhow::{Context, Result};
use folio_core::Config;
use folio_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the archival backend, or `None` when archiving is disabled.
pub async fn setup_storage(config: &Config) -> Result<Option<Arc<dyn Storage>>> {
    if !config.archive_enabled() {
        tracing::info!("Archiving disabled; original bytes are stored inline in records");
        return Ok(None);
    }

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        failure_policy = ?config.archive_failure_policy(),
        "Storage backend initialized"
    );

    Ok(Some(storage))
}
