//! Firestore document store over the REST API
//!
//! Records are written with `createDocument`, letting Firestore assign the
//! document id. Field values use Firestore's typed JSON encoding.

use async_trait::async_trait;
use base64::Engine;
use folio_core::models::{RecordPayload, StructuredRecord};
use folio_core::{Config, DatabaseBackend};
use folio_services::AccessTokenProvider;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::store::{DocumentStore, StoreError, StoreResult};

pub struct FirestoreDocumentStore {
    http_client: reqwest::Client,
    collection_url: String,
    token_provider: Arc<dyn AccessTokenProvider>,
}

impl Debug for FirestoreDocumentStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FirestoreDocumentStore")
            .field("collection_url", &self.collection_url)
            .finish()
    }
}

impl FirestoreDocumentStore {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: &str,
        project_id: &str,
        database: &str,
        collection: &str,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        let collection_url = format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            endpoint.trim_end_matches('/'),
            project_id,
            database,
            collection
        );
        Self {
            http_client,
            collection_url,
            token_provider,
        }
    }

    pub fn from_config(
        config: &Config,
        http_client: reqwest::Client,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self::new(
            http_client,
            config.firestore_endpoint(),
            config.firestore_project_id(),
            config.firestore_database(),
            config.documents_collection(),
            token_provider,
        )
    }

    async fn error_from(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(body);
        StoreError::Api { status, message }
    }
}

fn string_or_null(value: Option<&str>) -> Value {
    match value {
        Some(s) => json!({ "stringValue": s }),
        None => json!({ "nullValue": null }),
    }
}

/// Encode a record as a Firestore `Document` body.
fn encode_document(record: &StructuredRecord) -> Value {
    let mut fields = Map::new();
    fields.insert(
        "timestamp".to_string(),
        json!({ "doubleValue": record.timestamp }),
    );
    fields.insert(
        "content".to_string(),
        json!({ "stringValue": record.content }),
    );
    fields.insert(
        "user_id".to_string(),
        string_or_null(record.user_id.as_deref()),
    );
    fields.insert(
        "mimetype".to_string(),
        json!({ "stringValue": record.mimetype }),
    );

    match &record.payload {
        RecordPayload::RawBytes(bytes) => {
            fields.insert(
                "raw_bytes".to_string(),
                json!({ "bytesValue": base64::engine::general_purpose::STANDARD.encode(bytes) }),
            );
        }
        RecordPayload::Archived { storage_url } => {
            fields.insert(
                "storage_url".to_string(),
                string_or_null(storage_url.as_deref()),
            );
        }
    }

    json!({ "fields": fields })
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "firestore",
        db.operation = "insert",
        archived = record.is_archived()
    ))]
    async fn insert(&self, record: &StructuredRecord) -> StoreResult<String> {
        let token = self.token_provider.access_token().await?;

        let response = self
            .http_client
            .post(&self.collection_url)
            .bearer_auth(token)
            .json(&encode_document(record))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            tracing::error!(error = %err, "Failed to insert document record");
            return Err(err);
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        // name = projects/{p}/databases/{db}/documents/{collection}/{id}
        created
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(String::from)
            .ok_or_else(|| StoreError::InvalidResponse(format!("bad document name: {}", created.name)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        let token = self.token_provider.access_token().await?;

        let response = self
            .http_client
            .get(&self.collection_url)
            .query(&[("pageSize", "1")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Firestore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use folio_services::StaticTokenProvider;
    use mockito::Matcher;

    const COLLECTION_PATH: &str = "/v1/projects/demo/databases/(default)/documents/documents";

    fn store_for(server: &mockito::ServerGuard) -> FirestoreDocumentStore {
        FirestoreDocumentStore::new(
            reqwest::Client::new(),
            &server.url(),
            "demo",
            "(default)",
            "documents",
            Arc::new(StaticTokenProvider::new("test-token")),
        )
    }

    fn archived_record(storage_url: Option<&str>) -> StructuredRecord {
        StructuredRecord {
            timestamp: 1_700_000_000.5,
            content: "<html><body><p>Hi</p></body></html>".to_string(),
            user_id: Some("user-1".to_string()),
            mimetype: "application/pdf".to_string(),
            payload: RecordPayload::Archived {
                storage_url: storage_url.map(String::from),
            },
        }
    }

    #[test]
    fn test_encode_raw_bytes_record() {
        let record = StructuredRecord {
            timestamp: 12.5,
            content: "c".to_string(),
            user_id: None,
            mimetype: "image/png".to_string(),
            payload: RecordPayload::RawBytes(Bytes::from_static(b"hello")),
        };

        let doc = encode_document(&record);
        assert_eq!(doc["fields"]["timestamp"]["doubleValue"], 12.5);
        assert_eq!(doc["fields"]["user_id"], json!({ "nullValue": null }));
        assert_eq!(doc["fields"]["raw_bytes"]["bytesValue"], "aGVsbG8=");
        assert!(doc["fields"].get("storage_url").is_none());
    }

    #[test]
    fn test_encode_degraded_archive_has_null_reference() {
        let doc = encode_document(&archived_record(None));
        assert_eq!(doc["fields"]["storage_url"], json!({ "nullValue": null }));
        assert!(doc["fields"].get("raw_bytes").is_none());
    }

    #[tokio::test]
    async fn test_insert_returns_generated_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", COLLECTION_PATH)
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "user_id": { "stringValue": "user-1" },
                    "storage_url": { "stringValue": "gs://b/uploads/user-1/a.pdf" }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"name": "projects/demo/databases/(default)/documents/documents/Xk2mQ9", "fields": {}}"#,
            )
            .create_async()
            .await;

        let id = store_for(&server)
            .insert(&archived_record(Some("gs://b/uploads/user-1/a.pdf")))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(id, "Xk2mQ9");
    }

    #[tokio::test]
    async fn test_insert_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", COLLECTION_PATH)
            .with_status(403)
            .with_body(r#"{"error": {"code": 403, "message": "Missing or insufficient permissions."}}"#)
            .create_async()
            .await;

        let err = store_for(&server)
            .insert(&archived_record(None))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Firestore returned 403: Missing or insufficient permissions."
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/v1/projects/demo/databases/\(default\)/documents/documents".to_string()))
            .match_query(Matcher::UrlEncoded("pageSize".to_string(), "1".to_string()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        store_for(&server).health_check().await.unwrap();
        mock.assert_async().await;
    }
}
