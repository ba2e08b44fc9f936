//! Route configuration and setup

use crate::handlers::{
    health::{liveness_check, readiness_check},
    preflight::preflight,
    submit::{method_not_allowed, submit_document},
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use folio_core::Config;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let mut submit = post(submit_document);
    if config.cors_preflight_enabled() {
        submit = submit.options(preflight);
    }
    let submit = submit.fallback(method_not_allowed);

    let app = Router::new()
        .route("/", submit)
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .layer(DefaultBodyLimit::disable())
        // One semaphore shared by every route
        .layer(GlobalConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(TraceLayer::new_for_http());

    let app = if config.cors_preflight_enabled() {
        let origin = HeaderValue::from_str(config.cors_allow_origin())
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ALLOW_ORIGIN: {}", e))?;
        app.layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
    } else {
        app
    };

    Ok(app.with_state(state))
}
