//! Gemini (generative-language backend) client module.
//!
//! Provides the async client used to turn a composed prompt into a
//! completion, plus the trait the dispatcher depends on.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use error::{GeminiError, GeminiResult};
pub use types::*;

/// Minimal generation API abstraction for testability.
///
/// Implementations make exactly one backend call per invocation and never
/// retry.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> GeminiResult<GenerateContentResponse>;
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> GeminiResult<GenerateContentResponse> {
        self.generate_content(prompt).await
    }
}
