//! API request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use otech_protocol::{ChatRequest, ChatResponse};
use serde::Serialize;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Compose a prompt from the posted history and attachment and return the
/// backend's reply.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(ApiError::from)?;
    info!(
        messages = request.messages.len(),
        attachment = request.has_attachment(),
        "chat request"
    );

    let response = state.dispatcher.dispatch(&request).await?;
    Ok(Json(ChatResponse { response }))
}
