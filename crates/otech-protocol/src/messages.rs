//! Chat request/response types.

use serde::{Deserialize, Serialize};

/// Message role.
///
/// Closed set: anything other than `"user"` or `"assistant"` fails to
/// deserialize, so a third role can never enter a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when the role is rendered into a prompt line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcript entry as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Empty string, or a `data:<mime>;base64,<payload>` CSV attachment.
    #[serde(rename = "csvFile", default)]
    pub csv_file: String,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            csv_file: String::new(),
        }
    }

    pub fn with_csv_file(mut self, data_uri: impl Into<String>) -> Self {
        self.csv_file = data_uri.into();
        self
    }

    pub fn has_attachment(&self) -> bool {
        !self.csv_file.trim().is_empty()
    }
}

/// Successful reply from `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
