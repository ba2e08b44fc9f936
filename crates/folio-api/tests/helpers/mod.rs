//! Test app with in-memory collaborators
//!
//! The extractor, archive storage and document store are mocks that record
//! every call, so tests can assert both the HTTP answer and which external
//! services were touched.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use folio_api::setup::routes::setup_routes;
use folio_api::{AppState, DocumentPipeline};
use folio_core::models::{DocumentLayout, Page, Paragraph, StructuredRecord, TextSegment};
use folio_core::{Config, DatabaseBackend, StorageBackend};
use folio_db::{DocumentStore, StoreError, StoreResult};
use folio_services::{ExtractError, LayoutExtractor};
use folio_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const SAMPLE_TEXT: &str = "Hello world\nSecond para";
pub const SAMPLE_HTML: &str = "<html><body><p>Hello world</p><p>Second para</p></body></html>";

/// Two pages with one paragraph each over [`SAMPLE_TEXT`].
pub fn sample_layout() -> DocumentLayout {
    DocumentLayout::new(
        SAMPLE_TEXT,
        vec![
            Page::new(vec![Paragraph::new(vec![TextSegment::new(0, 11)])]),
            Page::new(vec![Paragraph::new(vec![TextSegment::new(12, 23)])]),
        ],
    )
}

/// Mock layout extractor returning a fixed layout
pub struct MockExtractor {
    layout: Mutex<DocumentLayout>,
    fail: AtomicBool,
    calls: Mutex<Vec<(usize, String)>>,
    hold: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            layout: Mutex::new(sample_layout()),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Make the next extraction wait until [`MockExtractor::release`].
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held extraction has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.released.notify_one();
    }

    pub fn set_layout(&self, layout: DocumentLayout) {
        *self.layout.lock().unwrap() = layout;
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// (size, mime type) of every extraction request
    pub fn calls(&self) -> Vec<(usize, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LayoutExtractor for MockExtractor {
    async fn extract_layout(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<DocumentLayout, ExtractError> {
        self.calls
            .lock()
            .unwrap()
            .push((data.len(), mime_type.to_string()));
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractError::Api {
                status: 400,
                message: "Unsupported input file format.".to_string(),
            });
        }
        Ok(self.layout.lock().unwrap().clone())
    }
}

/// Mock archive storage backed by a HashMap
pub struct MockStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    fail_uploads: AtomicBool,
    uploads: AtomicUsize,
    deletes: Mutex<Vec<String>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), (data, content_type.to_string()));
        Ok(format!("gs://test-bucket/{}", storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(storage_key.to_string());
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Gcs
    }
}

/// Mock document store keeping inserted records in memory
pub struct MockDocumentStore {
    records: Mutex<Vec<StructuredRecord>>,
    fail: AtomicBool,
    attempts: AtomicUsize,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<StructuredRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn insert(&self, record: &StructuredRecord) -> StoreResult<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(format!("doc-{}", records.len()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidResponse("store down".to_string()));
        }
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Firestore
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub extractor: Arc<MockExtractor>,
    pub storage: Arc<MockStorage>,
    pub store: Arc<MockDocumentStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Wait for background storage cleanup to run.
    pub async fn wait_for_deletes(&self, expected: usize) -> Vec<String> {
        for _ in 0..50 {
            let deleted = self.storage.deleted_keys();
            if deleted.len() >= expected {
                return deleted;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.storage.deleted_keys()
    }
}

pub struct TestAppBuilder {
    env: HashMap<String, String>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let mut env = HashMap::new();
        env.insert("DOCUMENT_AI_PROJECT_ID".to_string(), "test-project".to_string());
        env.insert("DOCUMENT_AI_PROCESSOR_ID".to_string(), "test-processor".to_string());
        env.insert("GCS_BUCKET".to_string(), "test-bucket".to_string());
        Self { env }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> TestApp {
        let env = self.env;
        let config = Config::from_lookup(|key| env.get(key).cloned())
            .expect("Failed to build test config");

        let extractor = Arc::new(MockExtractor::new());
        let storage = Arc::new(MockStorage::new());
        let store = Arc::new(MockDocumentStore::new());

        let mut pipeline = DocumentPipeline::new(extractor.clone(), store.clone());
        let archive: Option<Arc<dyn Storage>> = if config.archive_enabled() {
            pipeline = pipeline.with_archive(storage.clone(), config.archive_failure_policy());
            Some(storage.clone())
        } else {
            None
        };

        let state = Arc::new(AppState {
            pipeline,
            document_store: store.clone(),
            storage: archive,
            cors_allow_origin: config.cors_allow_origin().to_string(),
        });

        let app = setup_routes(&config, state).expect("Failed to set up routes");
        let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

        TestApp {
            server,
            extractor,
            storage,
            store,
        }
    }
}

/// App with archiving enabled, fail policy and pre-flight answered.
pub fn setup_test_app() -> TestApp {
    TestAppBuilder::new().build()
}
