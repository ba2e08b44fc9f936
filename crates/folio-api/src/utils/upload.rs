//! Multipart form parsing for document submissions

use axum::extract::Multipart;
use folio_core::models::UploadedFile;
use folio_core::AppError;

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Name of the optional form field identifying the submitter.
pub const USER_ID_FIELD: &str = "user_id";

/// Read the `file` part (bytes, declared media type, filename) and the
/// optional `user_id` text field. Other fields are ignored.
pub async fn extract_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    let mut file: Option<(bytes::Bytes, Option<String>, Option<String>)> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FILE_FIELD => {
                if file.is_some() {
                    return Err(AppError::Upload(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(format!("Failed to read file data: {}", e)))?;

                file = Some((data, content_type, filename));
            }
            USER_ID_FIELD => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(format!("Failed to read user_id: {}", e)))?;
                // First occurrence wins
                if user_id.is_none() {
                    user_id = Some(value);
                }
            }
            _ => {}
        }
    }

    let (data, content_type, filename) =
        file.ok_or_else(|| AppError::Upload("No file provided in field 'file'".to_string()))?;

    Ok(UploadedFile::new(data, content_type, filename, user_id))
}
