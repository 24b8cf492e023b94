//! Request dispatcher.

use std::fmt;
use std::sync::Arc;

use otech_protocol::ChatRequest;
use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use super::reply::extract_reply;
use crate::csv_data::{DecodeError, RowPolicy, decode_attachment};
use crate::gemini::{GeminiError, GenerationBackend};
use crate::prompt::compose_prompt;

/// Stages a single dispatch moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Decoding,
    Composing,
    Generating,
    Extracting,
    Responded,
    DecodeFailed,
    GenerationFailed,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Decoding => "decoding",
            Self::Composing => "composing",
            Self::Generating => "generating",
            Self::Extracting => "extracting",
            Self::Responded => "responded",
            Self::DecodeFailed => "decode_failed",
            Self::GenerationFailed => "generation_failed",
        };
        f.write_str(name)
    }
}

/// Terminal failures of a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The attachment could not be decoded; the backend was not called.
    #[error("failed to decode attachment: {0}")]
    Decode(#[from] DecodeError),

    /// The backend call failed. Treated as opaque by callers.
    #[error("generation failed: {0}")]
    Generation(#[from] GeminiError),
}

impl DispatchError {
    pub fn stage(&self) -> DispatchStage {
        match self {
            Self::Decode(_) => DispatchStage::DecodeFailed,
            Self::Generation(_) => DispatchStage::GenerationFailed,
        }
    }
}

/// Turns one chat request into one reply.
///
/// Holds only the injected backend and the attachment policy, so a single
/// instance is shared by every request.
#[derive(Clone)]
pub struct ChatDispatcher {
    backend: Arc<dyn GenerationBackend>,
    row_policy: RowPolicy,
}

impl ChatDispatcher {
    pub fn new(backend: Arc<dyn GenerationBackend>, row_policy: RowPolicy) -> Self {
        Self {
            backend,
            row_policy,
        }
    }

    pub fn row_policy(&self) -> RowPolicy {
        self.row_policy
    }

    pub async fn dispatch(&self, request: &ChatRequest) -> Result<String, DispatchError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("dispatch", %request_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ChatRequest) -> Result<String, DispatchError> {
        debug!(
            stage = %DispatchStage::Received,
            messages = request.messages.len(),
            attachment = request.has_attachment()
        );

        debug!(stage = %DispatchStage::Decoding);
        let records = decode_attachment(&request.csv_file, self.row_policy).map_err(|err| {
            warn!(stage = %DispatchStage::DecodeFailed, error = %err, "rejecting attachment");
            DispatchError::Decode(err)
        })?;

        debug!(stage = %DispatchStage::Composing);
        let prompt = compose_prompt(&request.messages, records.as_deref());

        debug!(stage = %DispatchStage::Generating, prompt_len = prompt.len());
        let response = self.backend.generate(&prompt).await.map_err(|err| {
            warn!(stage = %DispatchStage::GenerationFailed, error = %err, "generation failed");
            DispatchError::Generation(err)
        })?;

        debug!(stage = %DispatchStage::Extracting);
        let reply = extract_reply(&response);

        debug!(stage = %DispatchStage::Responded, reply_len = reply.len());
        Ok(reply)
    }
}
