//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Nexus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Attachment content is not a usable base64 data URI.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Personality name does not match any known mode.
    #[error("Unknown personality: {0}")]
    UnknownPersonality(String),

    /// No message with the given id exists in the conversation.
    #[error("Message not found: {0}")]
    MessageNotFound(String),
}
