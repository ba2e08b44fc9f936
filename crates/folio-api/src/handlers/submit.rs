//! Document submission handler

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_upload;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

/// `POST /`: run the pipeline on the multipart `file` field.
pub async fn submit_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_upload(multipart?).await?;
    let document_id = state.pipeline.process(upload).await?;

    Ok((
        StatusCode::OK,
        format!("Data inserted successfully with ID: {}", document_id),
    ))
}

/// Any method the route does not serve.
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
}
