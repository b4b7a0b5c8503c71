//! Session transcript.
//!
//! The conversation is an append-only sequence. The only message ever
//! changed after being appended is the in-progress assistant reply, which
//! is located by id and has its text replaced by each stream update.

use crate::attachment::Attachment;
use crate::chat::{Message, Role};
use crate::error::CoreError;
use crate::ids::MessageId;
use crate::update::StreamUpdate;

/// Opening line of a fresh session.
pub const GREETING: &str = "Systems operational. I am Nexus. How can I assist you today?";

/// Ordered list of messages for one session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation opened by the assistant greeting.
    pub fn with_greeting() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
        }
    }

    /// Messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a message as-is.
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append a user turn.
    pub fn push_user(&mut self, text: impl Into<String>, attachments: Vec<Attachment>) -> MessageId {
        let mut message = Message::user(text);
        message.attachments = attachments;
        self.push(message)
    }

    /// Append the empty assistant placeholder that a stream will fill in.
    pub fn begin_assistant(&mut self) -> MessageId {
        self.begin_reply(Role::Assistant)
    }

    /// Append an empty reply placeholder under a pending role such as
    /// [`Role::Searching`]. The first update turns it into an assistant
    /// or error message.
    pub fn begin_reply(&mut self, role: Role) -> MessageId {
        self.push(Message::new(role, ""))
    }

    /// Replace the placeholder's text with the update's cumulative text.
    ///
    /// Error updates turn the placeholder into an error message.
    pub fn apply_update(&mut self, id: &MessageId, update: &StreamUpdate) -> Result<(), CoreError> {
        let message = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| &m.id == id)
            .ok_or_else(|| CoreError::MessageNotFound(id.to_string()))?;

        message.text.clone_from(&update.text);
        message.role = if update.error {
            Role::Error
        } else {
            Role::Assistant
        };
        Ok(())
    }
}
