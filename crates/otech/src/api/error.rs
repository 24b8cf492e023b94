//! API error handling.
//!
//! Error bodies are plain text; only successful replies are JSON.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error};

use crate::chat::DispatchError;

/// Body returned when the attachment cannot be decoded.
pub const CSV_ERROR_BODY: &str = "Error parsing CSV";

/// Body returned when the generation backend fails.
pub const GENERATION_ERROR_BODY: &str = "Error generating response";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::PayloadTooLarge(msg) | Self::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(msg) => error!(status = status.as_u16(), message = %msg, "API error"),
            _ => debug!(status = status.as_u16(), message = %self.message(), "Client error"),
        }

        (status, self.message().to_string()).into_response()
    }
}

/// Dispatch failures keep their cause in the logs and send a fixed body.
impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Decode(_) => ApiError::BadRequest(CSV_ERROR_BODY.to_string()),
            DispatchError::Generation(_) => ApiError::Internal(GENERATION_ERROR_BODY.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
