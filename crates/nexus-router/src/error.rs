//! Error types for the streaming router.

use nexus_core::StreamUpdate;
use thiserror::Error;

/// Errors that can occur while routing a turn to a backend.
///
/// The `Display` text of each variant is what the user sees in the
/// terminal error update.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No credential configured.
    #[error("Configuration Error: Missing API key.")]
    MissingCredential,

    /// Connection, DNS or read failure.
    #[error("Network Error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },

    /// Image attachment is not a usable data URI.
    #[error("Error: Invalid image data. {0}")]
    InvalidImageData(String),

    /// Image backend answered without any image payload.
    #[error("No image data returned from the image generation API.")]
    MissingImageData,

    /// Nothing to respond to.
    #[error("Error: The conversation has no messages.")]
    EmptyConversation,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RouterError> for StreamUpdate {
    fn from(err: RouterError) -> Self {
        StreamUpdate::failure(err.to_string())
    }
}
