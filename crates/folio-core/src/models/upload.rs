use bytes::Bytes;

/// Content type used when the multipart part does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Filename used when the multipart part does not declare one.
pub const DEFAULT_FILENAME: &str = "unknown";

/// A file received in a single request. Lives only for that request.
///
/// `data` is reference counted, so the archival step and the record builder can
/// both read the full content without copying it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Bytes,
    pub content_type: String,
    pub filename: String,
    pub user_id: Option<String>,
}

impl UploadedFile {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: Option<String>,
        filename: Option<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type
                .as_deref()
                .and_then(essence)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            filename: filename
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            user_id: user_id
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Bare media type of a `Content-Type` value: parameters dropped, lowercased.
fn essence(content_type: &str) -> Option<String> {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if media_type.is_empty() {
        None
    } else {
        Some(media_type.to_ascii_lowercase())
    }
}
