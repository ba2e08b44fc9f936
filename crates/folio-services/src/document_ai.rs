//! Google Document AI layout extraction
//!
//! Sends raw file bytes to a Document AI processor (`:process`, inline
//! `rawDocument`) and converts the returned document into a
//! [`DocumentLayout`]. Only the full text and the paragraph text anchors are
//! read from the response.

use async_trait::async_trait;
use base64::Engine;
use folio_core::models::{DocumentLayout, Page, Paragraph, TextSegment};
use folio_core::Config;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::auth::{AccessTokenProvider, AuthError};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to obtain access token: {0}")]
    Auth(#[from] AuthError),

    #[error("Document AI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Document AI returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Document AI response: {0}")]
    InvalidResponse(String),
}

/// Turns document bytes into a structured layout.
#[async_trait]
pub trait LayoutExtractor: Send + Sync {
    async fn extract_layout(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<DocumentLayout, ExtractError>;
}

/// Document AI REST client bound to a single processor.
pub struct DocumentAiClient {
    http_client: reqwest::Client,
    endpoint: String,
    processor_name: String,
    token_provider: Arc<dyn AccessTokenProvider>,
}

impl Debug for DocumentAiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DocumentAiClient")
            .field("endpoint", &self.endpoint)
            .field("processor_name", &self.processor_name)
            .finish()
    }
}

impl DocumentAiClient {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        processor_name: impl Into<String>,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            processor_name: processor_name.into(),
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
            config.document_ai_endpoint(),
            config.processor_name(),
            token_provider,
        )
    }

    fn process_url(&self) -> String {
        format!("{}/v1/{}:process", self.endpoint, self.processor_name)
    }
}

#[async_trait]
impl LayoutExtractor for DocumentAiClient {
    #[tracing::instrument(skip(self, data), fields(size = data.len(), mime_type = %mime_type))]
    async fn extract_layout(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<DocumentLayout, ExtractError> {
        let token = self.token_provider.access_token().await?;

        let request_body = json!({
            "rawDocument": {
                "content": base64::engine::general_purpose::STANDARD.encode(data),
                "mimeType": mime_type,
            }
        });

        let response = self
            .http_client
            .post(self.process_url())
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExtractError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let body = response.text().await?;
        let parsed: ProcessResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractError::InvalidResponse(e.to_string()))?;
        let document = parsed
            .document
            .ok_or_else(|| ExtractError::InvalidResponse("missing document".to_string()))?;

        let layout = document.into_layout();
        tracing::debug!(
            pages = layout.page_count(),
            paragraphs = layout.paragraph_count(),
            "Document AI processing completed"
        );
        Ok(layout)
    }
}

/// Google error bodies look like `{"error": {"message": ...}}`; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.to_string())
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: Option<ApiDocument>,
}

#[derive(Deserialize)]
struct ApiDocument {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Deserialize)]
struct ApiPage {
    #[serde(default)]
    paragraphs: Vec<ApiParagraph>,
}

#[derive(Deserialize)]
struct ApiParagraph {
    layout: Option<ApiLayout>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLayout {
    text_anchor: Option<ApiTextAnchor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextAnchor {
    #[serde(default)]
    text_segments: Vec<ApiTextSegment>,
}

// int64 fields are JSON strings in proto3 JSON; zero values are omitted
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextSegment {
    #[serde(default, deserialize_with = "deserialize_index")]
    start_index: usize,
    #[serde(default, deserialize_with = "deserialize_index")]
    end_index: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Number(u64),
    Text(String),
}

fn deserialize_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match RawIndex::deserialize(deserializer)? {
        RawIndex::Number(n) => n,
        RawIndex::Text(s) => s.parse::<u64>().map_err(serde::de::Error::custom)?,
    };
    usize::try_from(value).map_err(serde::de::Error::custom)
}

impl ApiDocument {
    fn into_layout(self) -> DocumentLayout {
        let pages = self
            .pages
            .into_iter()
            .map(|page| {
                Page::new(
                    page.paragraphs
                        .into_iter()
                        .map(|paragraph| {
                            let segments = paragraph
                                .layout
                                .and_then(|l| l.text_anchor)
                                .map(|a| a.text_segments)
                                .unwrap_or_default()
                                .into_iter()
                                .map(|s| TextSegment::new(s.start_index, s.end_index))
                                .collect();
                            Paragraph::new(segments)
                        })
                        .collect(),
                )
            })
            .collect();

        DocumentLayout::new(self.text, pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use folio_core::assemble_text;

    const PROCESS_PATH: &str = "/v1/projects/p1/locations/us/processors/proc1:process";

    fn client_for(server: &mockito::ServerGuard) -> DocumentAiClient {
        DocumentAiClient::new(
            reqwest::Client::new(),
            server.url(),
            "projects/p1/locations/us/processors/proc1",
            Arc::new(StaticTokenProvider::new("test-token")),
        )
    }

    #[tokio::test]
    async fn test_extract_layout_success() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "document": {
                "text": "Hello world\nSecond para",
                "pages": [{
                    "paragraphs": [
                        {"layout": {"textAnchor": {"textSegments": [{"endIndex": "5"}, {"startIndex": "6", "endIndex": "11"}]}}},
                        {"layout": {"textAnchor": {"textSegments": [{"startIndex": 12, "endIndex": 23}]}}}
                    ]
                }]
            }
        }"#;
        let mock = server
            .mock("POST", PROCESS_PATH)
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "rawDocument": {"content": "aGVsbG8=", "mimeType": "application/pdf"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let layout = client_for(&server)
            .extract_layout(b"hello", "application/pdf")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.paragraph_count(), 2);
        assert_eq!(layout.pages[0].paragraphs[0].segments[0], TextSegment::new(0, 5));
        assert_eq!(
            assemble_text(&layout).unwrap(),
            "Hello world\nSecond para"
        );
    }

    #[tokio::test]
    async fn test_paragraph_without_anchor_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PROCESS_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"document": {"text": "", "pages": [{"paragraphs": [{}]}, {}]}}"#)
            .create_async()
            .await;

        let layout = client_for(&server)
            .extract_layout(b"x", "image/png")
            .await
            .unwrap();

        assert_eq!(layout.page_count(), 2);
        assert!(layout.pages[0].paragraphs[0].segments.is_empty());
        assert!(layout.pages[1].paragraphs.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_message_extracted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PROCESS_PATH)
            .with_status(400)
            .with_body(r#"{"error": {"code": 400, "message": "Unsupported input file format.", "status": "INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .extract_layout(b"x", "text/plain")
            .await
            .unwrap_err();

        match err {
            ExtractError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported input file format.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PROCESS_PATH)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = client_for(&server)
            .extract_layout(b"x", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidResponse(_)));
    }

    #[test]
    fn test_non_json_error_body_kept() {
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }
}
