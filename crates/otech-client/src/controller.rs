//! Conversation controller.
//!
//! Owns the transcript, the pending input, the current attachment and the
//! submission state. A turn is split into [`ConversationController::begin_submit`]
//! (optimistic user append plus request snapshot) and
//! [`ConversationController::complete`] (reply append or failure), so a
//! front-end can render the loading state in between.

use otech_protocol::{ChatMessage, ChatRequest, Role};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::transport::{ChatTransport, TransportError};

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
        }
    }

    pub fn to_wire(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Why the last turn did not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub turn: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting {
        turn: Uuid,
    },
    Error(SubmitFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a message is already being sent")]
    Busy,

    #[error("nothing to send")]
    EmptyInput,

    #[error("turn {0} is not in flight")]
    StaleTurn(Uuid),
}

/// A submitted turn waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub id: Uuid,
    pub request: ChatRequest,
}

#[derive(Debug, Default)]
pub struct ConversationController {
    messages: Vec<Message>,
    input: String,
    attachment: Option<Attachment>,
    status: SubmissionStatus,
}

impl ConversationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the current attachment. It is sent with every later turn.
    pub fn attach(&mut self, attachment: Attachment) {
        debug!(file = attachment.file_name(), "attachment selected");
        self.attachment = Some(attachment);
    }

    pub fn detach(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitting { .. })
    }

    pub fn last_error(&self) -> Option<&SubmitFailure> {
        match &self.status {
            SubmissionStatus::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Start a turn from the current input.
    ///
    /// The user message is appended before anything is sent and the returned
    /// request carries the whole transcript including it.
    pub fn begin_submit(&mut self) -> Result<PendingTurn, ControllerError> {
        if self.is_loading() {
            return Err(ControllerError::Busy);
        }
        if self.input.trim().is_empty() {
            return Err(ControllerError::EmptyInput);
        }

        let content = std::mem::take(&mut self.input);
        self.messages.push(Message::new(Role::User, content));

        let turn = Uuid::new_v4();
        self.status = SubmissionStatus::Submitting { turn };

        let history = self.messages.iter().map(Message::to_wire).collect();
        let csv_file = self
            .attachment
            .as_ref()
            .map(|attachment| attachment.data_uri().to_string())
            .unwrap_or_default();

        debug!(%turn, messages = self.messages.len(), "turn submitted");
        Ok(PendingTurn {
            id: turn,
            request: ChatRequest::new(history).with_csv_file(csv_file),
        })
    }

    /// Finish the in-flight turn with the transport outcome.
    pub fn complete(
        &mut self,
        turn: Uuid,
        outcome: Result<String, TransportError>,
    ) -> Result<(), ControllerError> {
        match self.status {
            SubmissionStatus::Submitting { turn: in_flight } if in_flight == turn => {}
            _ => return Err(ControllerError::StaleTurn(turn)),
        }

        match outcome {
            Ok(reply) => {
                self.messages.push(Message::new(Role::Assistant, reply));
                self.status = SubmissionStatus::Idle;
            }
            Err(err) => {
                warn!(%turn, error = %err, "chat turn failed");
                self.status = SubmissionStatus::Error(SubmitFailure {
                    turn,
                    message: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run a whole turn over `transport`. Transport failures end up in
    /// [`SubmissionStatus::Error`], not in the returned result.
    pub async fn submit<T>(&mut self, transport: &T) -> Result<(), ControllerError>
    where
        T: ChatTransport + ?Sized,
    {
        let pending = self.begin_submit()?;
        let outcome = transport.send(&pending.request).await;
        self.complete(pending.id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that answers from a queue and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, TransportError>>>,
        sent: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        fn with(replies: Vec<Result<String, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<ChatRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()))
        }
    }

    fn server_error() -> TransportError {
        TransportError::Server {
            status: 500,
            message: "Error generating response".to_string(),
        }
    }

    #[tokio::test]
    async fn test_hello_round_trip() {
        let transport = ScriptedTransport::with(vec![Ok("Hi there".to_string())]);
        let mut controller = ConversationController::new();

        controller.set_input("Hello");
        controller.submit(&transport).await.unwrap();

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi there");
        assert_eq!(controller.status(), &SubmissionStatus::Idle);
        assert_eq!(controller.input(), "");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].messages, vec![ChatMessage::user("Hello")]);
        assert_eq!(sent[0].csv_file, "");
    }

    #[tokio::test]
    async fn test_each_turn_grows_history_by_two_and_resends_all() {
        let transport = ScriptedTransport::with(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
            Ok("third".to_string()),
        ]);
        let mut controller = ConversationController::new();

        for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
            controller.set_input(text);
            controller.submit(&transport).await.unwrap();
            assert_eq!(controller.messages().len(), 2 * (i + 1));
        }

        let sent = transport.sent();
        assert_eq!(sent[0].messages.len(), 1);
        assert_eq!(sent[1].messages.len(), 3);
        assert_eq!(sent[2].messages.len(), 5);
        assert_eq!(
            sent[2].messages,
            vec![
                ChatMessage::user("a"),
                ChatMessage::assistant("first"),
                ChatMessage::user("b"),
                ChatMessage::assistant("second"),
                ChatMessage::user("c"),
            ]
        );
    }

    #[test]
    fn test_begin_submit_is_optimistic() {
        let mut controller = ConversationController::new();
        controller.set_input("Hello");

        let pending = controller.begin_submit().unwrap();
        assert!(controller.is_loading());
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.input(), "");
        assert_eq!(
            controller.status(),
            &SubmissionStatus::Submitting { turn: pending.id }
        );
        assert_eq!(pending.request.messages, vec![ChatMessage::user("Hello")]);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_rejected() {
        let mut controller = ConversationController::new();
        controller.set_input("one");
        let pending = controller.begin_submit().unwrap();

        controller.set_input("two");
        assert_eq!(controller.begin_submit().unwrap_err(), ControllerError::Busy);
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.input(), "two");

        controller
            .complete(pending.id, Ok("reply".to_string()))
            .unwrap();
        assert!(controller.begin_submit().is_ok());
        assert_eq!(controller.messages().len(), 3);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let mut controller = ConversationController::new();
        controller.set_input("   \n");
        assert_eq!(
            controller.begin_submit().unwrap_err(),
            ControllerError::EmptyInput
        );
        assert!(controller.messages().is_empty());
        assert_eq!(controller.status(), &SubmissionStatus::Idle);
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_and_surfaces_error() {
        let transport = ScriptedTransport::with(vec![Err(server_error())]);
        let mut controller = ConversationController::new();

        controller.set_input("Hello");
        controller.submit(&transport).await.unwrap();

        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].content, "Hello");
        assert!(!controller.is_loading());
        let failure = controller.last_error().unwrap();
        assert!(failure.message.contains("Error generating response"));
    }

    #[tokio::test]
    async fn test_recovers_after_error() {
        let transport =
            ScriptedTransport::with(vec![Err(server_error()), Ok("back online".to_string())]);
        let mut controller = ConversationController::new();

        controller.set_input("first");
        controller.submit(&transport).await.unwrap();
        assert!(controller.last_error().is_some());

        controller.set_input("retry");
        controller.submit(&transport).await.unwrap();

        assert!(controller.last_error().is_none());
        assert_eq!(controller.status(), &SubmissionStatus::Idle);
        let contents: Vec<_> = controller
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "retry", "back online"]);
        assert_eq!(transport.sent()[1].messages.len(), 2);
    }

    #[test]
    fn test_stale_turn_changes_nothing() {
        let mut controller = ConversationController::new();
        let stranger = Uuid::new_v4();
        assert_eq!(
            controller.complete(stranger, Ok("late".to_string())),
            Err(ControllerError::StaleTurn(stranger))
        );

        controller.set_input("Hello");
        let pending = controller.begin_submit().unwrap();
        assert!(controller.complete(stranger, Ok("late".to_string())).is_err());
        assert_eq!(controller.messages().len(), 1);
        assert!(controller.is_loading());

        controller
            .complete(pending.id, Ok("on time".to_string()))
            .unwrap();
        assert_eq!(
            controller.complete(pending.id, Ok("again".to_string())),
            Err(ControllerError::StaleTurn(pending.id))
        );
        assert_eq!(controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_attachment_sent_until_detached() {
        let transport = ScriptedTransport::default();
        let mut controller = ConversationController::new();
        controller.attach(Attachment::from_bytes("data.csv", b"a,b\n1,2\n"));

        controller.set_input("one");
        controller.submit(&transport).await.unwrap();
        controller.set_input("two");
        controller.submit(&transport).await.unwrap();

        let detached = controller.detach().unwrap();
        assert_eq!(detached.file_name(), "data.csv");
        controller.set_input("three");
        controller.submit(&transport).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].csv_file, detached.data_uri());
        assert_eq!(sent[1].csv_file, detached.data_uri());
        assert_eq!(sent[2].csv_file, "");
    }

    #[test]
    fn test_message_ids_are_unique() {
        let mut controller = ConversationController::new();
        controller.set_input("Hello");
        let pending = controller.begin_submit().unwrap();
        controller
            .complete(pending.id, Ok("Hello".to_string()))
            .unwrap();

        let messages = controller.messages();
        assert_ne!(messages[0].id, messages[1].id);
        assert_eq!(messages[0].content, messages[1].content);
    }
}
