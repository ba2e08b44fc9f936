//! Folio API Library
//!
//! HTTP surface of the document ingestion service: the submission endpoint,
//! pre-flight handling, health probes and application setup.

pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

// Re-exports
pub use error::HttpAppError;
pub use services::pipeline::DocumentPipeline;
pub use state::AppState;
