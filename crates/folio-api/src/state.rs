//! Application state shared by all handlers.

use crate::services::pipeline::DocumentPipeline;
use folio_db::DocumentStore;
use folio_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: DocumentPipeline,
    /// Also probed directly by the readiness check
    pub document_store: Arc<dyn DocumentStore>,
    pub storage: Option<Arc<dyn Storage>>,
    /// `Access-Control-Allow-Origin` value sent with pre-flight answers
    pub cors_allow_origin: String,
}
