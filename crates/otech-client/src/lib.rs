//! Client side of the Otech assistant.
//!
//! [`ConversationController`] owns the transcript and the submission state
//! machine; a [`ChatTransport`] carries each turn to the server.

pub mod attachment;
pub mod controller;
pub mod transport;

pub use attachment::{Attachment, AttachmentError};
pub use controller::{
    ControllerError, ConversationController, Message, PendingTurn, SubmissionStatus,
    SubmitFailure,
};
pub use transport::{ChatTransport, HttpTransport, TransportError};
