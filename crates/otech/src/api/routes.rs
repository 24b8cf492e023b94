//! API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router with a request body limit in megabytes.
pub fn create_router(state: AppState, max_body_mb: usize) -> Router {
    let max_body_size = max_body_mb * 1024 * 1024;

    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        // Path used by the web front-end
        .route("/api/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(build_cors_layer())
        .layer(trace_layer)
        .with_state(state)
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}
