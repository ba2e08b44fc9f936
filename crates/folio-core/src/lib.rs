//! Folio Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! text assembly and HTML formatting shared by all Folio components.

pub mod assemble;
pub mod config;
pub mod error;
pub mod html;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use assemble::{assemble_text, LayoutError};
pub use config::{ArchiveFailurePolicy, BaseConfig, Config, DatabaseBackend, LogFormat, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use html::{escape_html, to_html};
pub use storage_types::StorageBackend;
