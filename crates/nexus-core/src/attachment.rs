//! Attachments carried by user messages.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mime type assumed when a data URI declares none.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Kind of content an attachment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Image stored as a base64 data URI.
    Image,
    /// Raw text (source files, logs, notes).
    Text,
}

/// A file attached to a message.
///
/// Owned by exactly one message and never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// What the content is.
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Raw text, or a `data:<mime>;base64,<payload>` URI for images.
    pub content: String,
    /// Original file name.
    pub name: String,
}

impl Attachment {
    /// Create a text attachment.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            content: content.into(),
            name: name.into(),
        }
    }

    /// Create an image attachment from an already-encoded data URI.
    pub fn image(name: impl Into<String>, data_uri: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            content: data_uri.into(),
            name: name.into(),
        }
    }

    /// Build an attachment from raw file contents.
    ///
    /// `image/*` files become data-URI image attachments, anything else is
    /// read as (lossy) UTF-8 text.
    pub fn from_file(name: impl Into<String>, mime_type: &str, bytes: &[u8]) -> Self {
        if mime_type.starts_with("image/") {
            Self::image(name, DataUri::encode(mime_type, bytes).to_string())
        } else {
            Self::text(name, String::from_utf8_lossy(bytes).into_owned())
        }
    }

    /// Returns true for image attachments.
    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image
    }
}

/// A parsed `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared mime type.
    pub mime_type: String,
    /// Base64 payload, still encoded.
    pub data: String,
}

impl DataUri {
    /// Encode raw bytes as a data URI.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    /// Parse and validate a base64 data URI.
    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::InvalidDataUri("missing 'data:' scheme".to_string()))?;

        let (mime, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| CoreError::InvalidDataUri("missing ';base64,' marker".to_string()))?;

        if data.is_empty() {
            return Err(CoreError::InvalidDataUri("empty payload".to_string()));
        }

        BASE64
            .decode(data)
            .map_err(|e| CoreError::InvalidDataUri(format!("payload is not base64: {}", e)))?;

        let mime = mime.trim();
        Ok(Self {
            mime_type: if mime.is_empty() {
                DEFAULT_IMAGE_MIME.to_string()
            } else {
                mime.to_string()
            },
            data: data.to_string(),
        })
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}
