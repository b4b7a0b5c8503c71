//! Vision adapter.
//!
//! Sends only the active turn (text plus one image); prior history is not
//! included.

use std::sync::Arc;

use nexus_core::{Attachment, DataUri, PersonalityMode};
use tracing::warn;

use crate::config::{ChatBackendConfig, RouterConfig};
use crate::decoder::StreamDecoder;
use crate::error::RouterError;
use crate::stream::UpdateStream;
use crate::types::{
    ChatRequest, ChatRequestMessage, ContentPart, ImageUrl, MessageContent, RequestRole,
};

/// Prompt used when an image arrives without any text.
const DEFAULT_VISION_PROMPT: &str = "Describe this image.";

/// Streams answers about an attached image.
#[derive(Debug, Clone)]
pub struct VisionAdapter {
    decoder: StreamDecoder,
    config: Arc<RouterConfig>,
}

impl VisionAdapter {
    /// Create a vision adapter.
    pub fn new(decoder: StreamDecoder, config: Arc<RouterConfig>) -> Self {
        Self { decoder, config }
    }

    /// Stream an answer to `prompt` about `image`.
    pub fn stream(
        &self,
        prompt: &str,
        image: &Attachment,
        personality: PersonalityMode,
    ) -> UpdateStream {
        let Some(api_key) = self.config.credential() else {
            warn!("Vision request without credential");
            return UpdateStream::single(RouterError::MissingCredential.into());
        };

        let data_uri = match DataUri::parse(&image.content) {
            Ok(uri) => uri,
            Err(e) => {
                warn!(error = %e, attachment = %image.name, "Rejecting image attachment");
                return UpdateStream::single(RouterError::InvalidImageData(e.to_string()).into());
            }
        };

        let request = build_vision_request(&self.config.vision, prompt, &data_uri, personality);
        self.decoder.open(&self.config.vision.endpoint, api_key, request)
    }
}

/// Build the streaming request for the vision backend.
pub fn build_vision_request(
    backend: &ChatBackendConfig,
    prompt: &str,
    image: &DataUri,
    personality: PersonalityMode,
) -> ChatRequest {
    let text = if prompt.trim().is_empty() {
        DEFAULT_VISION_PROMPT
    } else {
        prompt
    };

    ChatRequest {
        model: backend.model.clone(),
        messages: vec![
            ChatRequestMessage::text(RequestRole::System, personality.system_prompt()),
            ChatRequestMessage {
                role: RequestRole::User,
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: text.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_string(),
                        },
                    },
                ]),
            },
        ],
        stream: true,
        extra: backend.extra.clone(),
    }
}
