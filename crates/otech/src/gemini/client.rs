//! Gemini HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::error::{GeminiError, GeminiResult};
use super::types::*;
use crate::config::GeminiConfig;

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// HTTP client.
    client: Client,
    /// Base URL (e.g., "https://generativelanguage.googleapis.com").
    base_url: String,
    /// Model name (e.g., "gemini-1.5-flash").
    model: String,
    /// API key; `None` makes every call fail without touching the network.
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: &GeminiConfig) -> GeminiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send `prompt` as a single user turn. One HTTP request, no retries.
    pub async fn generate_content(&self, prompt: &str) -> GeminiResult<GenerateContentResponse> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;
        let url = self.endpoint();
        debug!(model = %self.model, prompt_len = prompt.len(), "calling Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle response and parse JSON or error.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> GeminiResult<GenerateContentResponse> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| GeminiError::ParseError(format!("Failed to parse response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body,
        };
        warn!(status = status.as_u16(), %message, "Gemini returned an error");

        Err(GeminiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        let config = GeminiConfig {
            api_key: api_key.map(str::to_string),
            base_url: format!("{}/", server.uri()),
            ..GeminiConfig::default()
        };
        GeminiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "User: Hello\n\n"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Hi there"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let response = client.generate_content("User: Hello\n\n").await.unwrap();
        assert_eq!(response.first_candidate_text(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("bad-key"));
        let err = client.generate_content("prompt").await.unwrap_err();
        match err {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate_content("prompt").await.unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate_content("prompt").await.unwrap_err();
        assert!(matches!(err, GeminiError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(!client.has_api_key());
        let err = client.generate_content("prompt").await.unwrap_err();
        assert!(matches!(err, GeminiError::MissingApiKey));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = GeminiConfig {
            api_key: Some("   ".to_string()),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert!(!client.has_api_key());
        assert_eq!(client.model(), "gemini-1.5-flash");
    }
}
