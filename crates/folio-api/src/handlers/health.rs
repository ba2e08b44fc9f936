//! Health check handlers

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "ready", "timeout", or "not_ready: {error}".
async fn run_check<F, E>(f: F) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(CHECK_TIMEOUT, f).await {
        Ok(Ok(())) => "ready".to_string(),
        Ok(Err(e)) => format!("not_ready: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - document store and, when archiving, the object store.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = serde_json::json!({ "status": "ready" });

    let database = run_check(state.document_store.health_check()).await;
    if database != "ready" {
        tracing::error!(database = %database, "Document store readiness check failed");
    }
    let mut ready = database == "ready";
    response["database"] = serde_json::json!(database);

    if let Some(storage) = state.storage.clone() {
        let status = run_check(async move {
            storage
                .exists("health-check-non-existent-key")
                .await
                .map(drop)
        })
        .await;
        if status != "ready" {
            tracing::error!(storage = %status, "Storage readiness check failed");
        }
        ready &= status == "ready";
        response["storage"] = serde_json::json!(status);
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        response["status"] = serde_json::json!("not_ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
