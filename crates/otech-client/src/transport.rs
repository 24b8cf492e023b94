//! Transport between the conversation controller and the assistant server.

use async_trait::async_trait;
use otech_protocol::{ChatRequest, ChatResponse};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The server refused the request (HTTP 400), e.g. an unreadable CSV.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Sends one turn and returns the assistant's reply text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError>;
}

/// JSON-over-HTTP transport targeting `<server>/chat`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
        debug!(
            messages = request.messages.len(),
            attachment = request.has_attachment(),
            "sending chat turn"
        );

        let response = self.client.post(self.chat_url()).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::BAD_REQUEST {
            return Err(TransportError::Rejected(body));
        }
        if !status.is_success() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        Ok(parsed.response)
    }
}
