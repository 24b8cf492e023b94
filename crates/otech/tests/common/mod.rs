//! Test utilities and common setup.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use base64::Engine;
use otech::api::{self, AppState};
use otech::csv_data::RowPolicy;
use otech::gemini::{GeminiError, GeminiResult, GenerateContentResponse, GenerationBackend};

/// Backend that records every prompt and answers from a fixed script.
pub struct FakeBackend {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(&self, prompt: &str) -> GeminiResult<GenerateContentResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(GenerateContentResponse::from_text(text.clone())),
            None => Err(GeminiError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            }),
        }
    }
}

/// Router wired to `backend` with the default row policy.
pub fn test_app(backend: Arc<FakeBackend>) -> Router {
    let state = AppState::with_backend(backend, RowPolicy::Omit);
    api::create_router(state, 10)
}

/// Encode CSV text the way a browser file reader does.
pub fn csv_data_uri(text: &str) -> String {
    format!(
        "data:text/csv;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(text)
    )
}
