//! Folio Storage Library
//!
//! Archival storage for original uploads. It includes the Storage trait and
//! implementations for Google Cloud Storage, S3 and the local filesystem.
//!
//! # Storage key format
//!
//! All backends store uploads under `uploads/{user_id}/{filename}`, with
//! `anonymous` standing in for a missing user. Keys never contain `..` or a
//! leading `/`; see the `keys` module.

#[cfg(any(feature = "storage-gcs", feature = "storage-s3"))]
pub mod cloud;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
#[cfg(any(feature = "storage-gcs", feature = "storage-s3"))]
pub use cloud::CloudStorage;
#[cfg(feature = "storage-gcs")]
pub use cloud::GcsStorage;
#[cfg(feature = "storage-s3")]
pub use cloud::S3Storage;
pub use factory::create_storage;
pub use folio_core::StorageBackend;
pub use keys::archive_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
