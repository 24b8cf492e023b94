//! Application state shared across handlers.

use std::sync::Arc;

use crate::chat::ChatDispatcher;
use crate::csv_data::RowPolicy;
use crate::gemini::GenerationBackend;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: ChatDispatcher,
}

impl AppState {
    pub fn new(dispatcher: ChatDispatcher) -> Self {
        Self { dispatcher }
    }

    /// State around an arbitrary backend, e.g. a fake in tests.
    pub fn with_backend(backend: Arc<dyn GenerationBackend>, row_policy: RowPolicy) -> Self {
        Self::new(ChatDispatcher::new(backend, row_policy))
    }
}
