//! Folio document database
//!
//! Persists one [`folio_core::models::StructuredRecord`] per processed upload,
//! either in a Firestore collection or in a PostgreSQL table.

pub mod firestore;
pub mod postgres;
pub mod store;

pub use firestore::FirestoreDocumentStore;
pub use postgres::{connect_postgres, PostgresDocumentStore};
pub use store::{create_document_store, DocumentStore, StoreError, StoreResult};
