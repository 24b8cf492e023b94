//! Gemini client error types.

use thiserror::Error;

/// Result type for Gemini operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Errors that can occur while calling the generation backend.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// No API key configured; no request was sent.
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Gemini returned an error response.
    #[error("Gemini error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}
