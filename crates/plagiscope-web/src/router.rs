//! Axum router: maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    page::{index, stylesheet, healthz},
    document::{upload_document, set_document_text, update_settings},
    references::{add_reference, update_reference, remove_reference, toggle_reference, upload_reference},
    analysis::{analyze, reset, dismiss_error, api_session, api_result},
};
use crate::sse::sse_handler;

/// Largest accepted upload (documents and reference files).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    build_router_shared(Arc::new(state))
}

/// Same as [`build_router`] for callers that keep their own handle on the state.
pub fn build_router_shared(shared: SharedState) -> Router {
    Router::new()
        // Pages
        .route("/",               get(index))
        .route("/static/main.css", get(stylesheet))
        .route("/healthz",        get(healthz))

        // Document and settings
        .route("/document/upload", post(upload_document))
        .route("/document/text",   post(set_document_text))
        .route("/settings",        post(update_settings))

        // References
        .route("/references/add",             post(add_reference))
        .route("/references/upload",          post(upload_reference))
        .route("/references/{index}/update",  post(update_reference))
        .route("/references/{index}/remove",  post(remove_reference))
        .route("/references/{index}/toggle",  post(toggle_reference))

        // Analysis
        .route("/analyze",       post(analyze))
        .route("/reset",         post(reset))
        .route("/error/dismiss", post(dismiss_error))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/api/session", get(api_session))
        .route("/api/result",  get(api_result))

        // Middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
