//! Wire protocol for the Otech assistant.
//!
//! These are the JSON shapes exchanged over `POST /chat`. The server and the
//! terminal client both depend on this crate so the two sides cannot drift.

mod messages;

pub use messages::{ChatMessage, ChatRequest, ChatResponse, Role};
