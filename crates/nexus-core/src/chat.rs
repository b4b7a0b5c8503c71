//! Chat message types for conversation history.

use serde::{Deserialize, Serialize};

use crate::attachment::{Attachment, AttachmentKind};
use crate::ids::MessageId;

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// User message (input/prompt).
    User,
    /// Assistant message (response).
    Assistant,
    /// System message (instructions).
    System,
    /// Transient typing indicator.
    Typing,
    /// Transient "searching the web" indicator.
    Searching,
    /// Failed response.
    Error,
    /// Image synthesis in progress.
    ImageGen,
}

impl Role {
    /// Transient roles mark a reply that has not produced text yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Role::Typing | Role::Searching | Role::ImageGen)
    }

    /// Status line for a pending reply.
    pub fn indicator(&self) -> Option<&'static str> {
        match self {
            Role::Typing => Some("Thinking..."),
            Role::Searching => Some("Searching..."),
            Role::ImageGen => Some("Synthesizing image..."),
            _ => None,
        }
    }
}

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Stable id, assigned at creation.
    pub id: MessageId,
    /// Role of this message.
    pub role: Role,
    /// Message content.
    pub text: String,
    /// Optional reasoning trace shown separately from the answer.
    ///
    /// Kept for transcript compatibility; the router never produces one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    /// Files attached to this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Unix timestamp (milliseconds) when message was created.
    pub timestamp: i64,
}

impl Message {
    /// Create a new chat message.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            text: text.into(),
            thought: None,
            attachments: Vec::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Builder method to attach a file.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// First image attachment, if any.
    pub fn image_attachment(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.is_image())
    }

    /// All text attachments, in order.
    pub fn text_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.kind == AttachmentKind::Text)
    }
}
