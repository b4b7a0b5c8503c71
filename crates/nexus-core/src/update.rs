//! Incremental results published by the router.

use serde::{Deserialize, Serialize};

/// One step of a streamed answer.
///
/// `text` is always the full answer accumulated so far, never a fragment,
/// so consumers replace their previous state instead of appending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUpdate {
    /// Cumulative answer text.
    pub text: String,
    /// True for the last update of a stream.
    pub is_complete: bool,
    /// True when the stream ended in failure.
    #[serde(default)]
    pub error: bool,
}

impl StreamUpdate {
    /// A non-final update.
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_complete: false,
            error: false,
        }
    }

    /// The final, successful update.
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_complete: true,
            error: false,
        }
    }

    /// The final update of a failed stream.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_complete: true,
            error: true,
        }
    }
}
