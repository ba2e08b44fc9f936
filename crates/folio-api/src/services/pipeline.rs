//! Document ingestion pipeline
//!
//! extract layout → assemble text → archive original (optional) → render HTML
//! → build record → persist. Runs once per request; every failure surfaces
//! as an [`AppError`].

use folio_core::models::{RecordPayload, StructuredRecord, UploadedFile};
use folio_core::{assemble_text, to_html, AppError, ArchiveFailurePolicy};
use folio_db::DocumentStore;
use folio_services::LayoutExtractor;
use folio_storage::{archive_key, Storage};
use std::sync::Arc;

#[derive(Clone)]
struct ArchiveStep {
    storage: Arc<dyn Storage>,
    failure_policy: ArchiveFailurePolicy,
}

#[derive(Clone)]
pub struct DocumentPipeline {
    extractor: Arc<dyn LayoutExtractor>,
    archive: Option<ArchiveStep>,
    store: Arc<dyn DocumentStore>,
}

/// Outcome of the archival step.
struct Archived {
    key: Option<String>,
    storage_url: Option<String>,
}

impl DocumentPipeline {
    /// Pipeline that stores the original bytes inline in each record.
    pub fn new(extractor: Arc<dyn LayoutExtractor>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            extractor,
            archive: None,
            store,
        }
    }

    /// Archive originals in `storage` and store only the reference in records.
    pub fn with_archive(
        mut self,
        storage: Arc<dyn Storage>,
        failure_policy: ArchiveFailurePolicy,
    ) -> Self {
        self.archive = Some(ArchiveStep {
            storage,
            failure_policy,
        });
        self
    }

    /// Process one upload and return the identifier of the persisted record.
    #[tracing::instrument(skip(self, upload), fields(
        filename = %upload.filename,
        mime_type = %upload.content_type,
        size_bytes = upload.size()
    ))]
    pub async fn process(&self, upload: UploadedFile) -> Result<String, AppError> {
        let start = std::time::Instant::now();
        tracing::info!("Processing uploaded document");

        let layout = self
            .extractor
            .extract_layout(&upload.data, &upload.content_type)
            .await
            .map_err(|e| AppError::Extraction(e.to_string()))?;
        let text = assemble_text(&layout)?;

        let (payload, archived_key) = match &self.archive {
            Some(step) => {
                let archived = Self::archive_original(step, &upload).await?;
                (
                    RecordPayload::Archived {
                        storage_url: archived.storage_url,
                    },
                    archived.key,
                )
            }
            None => (RecordPayload::RawBytes(upload.data.clone()), None),
        };

        let record = StructuredRecord::new(
            to_html(&text),
            upload.user_id.clone(),
            upload.content_type.clone(),
            payload,
        );

        let document_id = match self.store.insert(&record).await {
            Ok(id) => id,
            Err(e) => {
                if let (Some(key), Some(step)) = (archived_key, &self.archive) {
                    Self::spawn_cleanup(step.storage.clone(), key);
                }
                return Err(AppError::Database(e.to_string()));
            }
        };

        tracing::info!(
            document_id = %document_id,
            pages = layout.page_count(),
            archived = record.storage_url().is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document stored"
        );

        Ok(document_id)
    }

    async fn archive_original(
        step: &ArchiveStep,
        upload: &UploadedFile,
    ) -> Result<Archived, AppError> {
        let result = match archive_key(upload.user_id.as_deref(), &upload.filename) {
            Ok(key) => step
                .storage
                .upload_with_key(&key, upload.data.clone(), &upload.content_type)
                .await
                .map(|url| (key, url)),
            Err(e) => Err(e),
        };

        match result {
            Ok((key, url)) => Ok(Archived {
                key: Some(key),
                storage_url: Some(url),
            }),
            Err(e) => match step.failure_policy {
                ArchiveFailurePolicy::Fail => Err(AppError::Storage(e.to_string())),
                ArchiveFailurePolicy::Degrade => {
                    tracing::warn!(
                        error = %e,
                        "Archiving original failed; storing record without reference"
                    );
                    Ok(Archived {
                        key: None,
                        storage_url: None,
                    })
                }
            },
        }
    }

    /// Remove an archived original whose record could not be written.
    fn spawn_cleanup(storage: Arc<dyn Storage>, key: String) {
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&key).await {
                tracing::warn!(error = %e, key = %key, "Failed to remove orphaned archive object");
            } else {
                tracing::info!(key = %key, "Removed orphaned archive object");
            }
        });
    }
}
