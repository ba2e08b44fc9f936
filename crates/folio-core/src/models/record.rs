use bytes::Bytes;
use chrono::{DateTime, Utc};

/// What the record carries besides the extracted content.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    /// The original file bytes are stored inline in the record.
    RawBytes(Bytes),
    /// The original file was archived in object storage. `None` when archival
    /// failed under the degrade policy.
    Archived { storage_url: Option<String> },
}

/// Flat record persisted once per processed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// Formatted HTML content.
    pub content: String,
    pub user_id: Option<String>,
    pub mimetype: String,
    pub payload: RecordPayload,
}

impl StructuredRecord {
    pub fn new(
        content: String,
        user_id: Option<String>,
        mimetype: String,
        payload: RecordPayload,
    ) -> Self {
        Self::at(Utc::now(), content, user_id, mimetype, payload)
    }

    pub fn at(
        created_at: DateTime<Utc>,
        content: String,
        user_id: Option<String>,
        mimetype: String,
        payload: RecordPayload,
    ) -> Self {
        Self {
            timestamp: epoch_seconds(created_at),
            content,
            user_id,
            mimetype,
            payload,
        }
    }

    pub fn raw_bytes(&self) -> Option<&Bytes> {
        match &self.payload {
            RecordPayload::RawBytes(bytes) => Some(bytes),
            RecordPayload::Archived { .. } => None,
        }
    }

    pub fn storage_url(&self) -> Option<&str> {
        match &self.payload {
            RecordPayload::Archived { storage_url } => storage_url.as_deref(),
            RecordPayload::RawBytes(_) => None,
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self.payload, RecordPayload::Archived { .. })
    }
}

fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}
