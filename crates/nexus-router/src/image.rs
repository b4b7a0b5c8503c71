//! Image generation adapter.
//!
//! Single request/response, no streaming. Failures are returned to the
//! caller, which decides how to present them.

use std::sync::Arc;

use nexus_core::DataUri;
use tracing::{error, info};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::intent::strip_trigger_phrases;
use crate::types::{ImageRequest, ImageResponse};

/// Mime type assumed for inline payloads that do not declare one.
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Generates one image per prompt.
#[derive(Debug, Clone)]
pub struct ImageAdapter {
    client: reqwest::Client,
    config: Arc<RouterConfig>,
}

impl ImageAdapter {
    /// Create an image adapter.
    pub fn new(client: reqwest::Client, config: Arc<RouterConfig>) -> Self {
        Self { client, config }
    }

    /// Generate an image and return a hosted URL or an inline data URI.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, RouterError> {
        let api_key = self
            .config
            .credential()
            .ok_or(RouterError::MissingCredential)?;
        let backend = &self.config.image;

        let request = ImageRequest {
            model: backend.model.clone(),
            prompt: strip_trigger_phrases(prompt, &backend.strip_phrases),
            size: backend.size.clone(),
            n: 1,
        };
        info!(
            model = %request.model,
            size = %request.size,
            relayed = backend.relay.is_some(),
            "Requesting image generation"
        );

        let response = self
            .client
            .post(backend.request_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), "Image endpoint returned error");
            return Err(RouterError::Api {
                status: status.as_u16(),
                body,
            });
        }

        extract_image(serde_json::from_str(&body)?)
    }
}

/// First usable image in a response: hosted URL first, then inline base64.
pub fn extract_image(response: ImageResponse) -> Result<String, RouterError> {
    response
        .data
        .into_iter()
        .find_map(|item| {
            if let Some(url) = item.url.filter(|u| !u.is_empty()) {
                return Some(url);
            }
            item.b64_json.filter(|b| !b.is_empty()).map(|data| {
                DataUri {
                    mime_type: item
                        .mime_type
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                    data,
                }
                .to_string()
            })
        })
        .ok_or(RouterError::MissingImageData)
}
