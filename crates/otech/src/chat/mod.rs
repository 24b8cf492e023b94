//! Per-request chat pipeline.
//!
//! Decoder, composer, generation backend and reply extraction wired together
//! by [`ChatDispatcher`]. Nothing here keeps state between requests.

mod dispatcher;
pub mod reply;

pub use dispatcher::{ChatDispatcher, DispatchError, DispatchStage};
pub use reply::{NO_RESPONSE_FALLBACK, extract_reply};
