//! Routes a conversation turn to exactly one backend.

use std::sync::Arc;

use nexus_core::{Message, PersonalityMode, StreamUpdate};
use tracing::{error, info, warn};

use crate::config::RouterConfig;
use crate::decoder::StreamDecoder;
use crate::error::RouterError;
use crate::image::ImageAdapter;
use crate::intent::{classify, Intent};
use crate::stream::UpdateStream;
use crate::text::TextAdapter;
use crate::vision::VisionAdapter;

/// Placeholder shown while an image is being generated.
pub const IMAGE_PENDING_TEXT: &str = "Initializing visual synthesis protocols...";

/// Streaming response router.
///
/// # Example
///
/// ```rust,no_run
/// use futures_util::StreamExt;
/// use nexus_core::{Message, PersonalityMode};
/// use nexus_router::{Router, RouterConfig};
///
/// async fn ask() {
///     let router = Router::new(RouterConfig::from_env());
///     let conversation = vec![Message::user("What is a monad?")];
///
///     let mut updates = router.stream_reply(&conversation, PersonalityMode::Academic);
///     while let Some(update) = updates.next().await {
///         println!("{}", update.text);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    config: Arc<RouterConfig>,
    text: TextAdapter,
    vision: VisionAdapter,
    image: ImageAdapter,
}

impl Router {
    /// Create a router with its own HTTP client.
    pub fn new(config: RouterConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a router on top of an existing HTTP client.
    pub fn with_client(config: RouterConfig, client: reqwest::Client) -> Self {
        let config = Arc::new(config);
        let decoder = StreamDecoder::new(client.clone());
        Self {
            text: TextAdapter::new(decoder.clone(), Arc::clone(&config)),
            vision: VisionAdapter::new(decoder, Arc::clone(&config)),
            image: ImageAdapter::new(client, Arc::clone(&config)),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Answer the last message of `conversation`.
    ///
    /// Exactly one backend runs, chosen by priority: image generation,
    /// then vision, then text. The returned stream always ends with one
    /// update that has `is_complete` set.
    pub fn stream_reply(
        &self,
        conversation: &[Message],
        personality: PersonalityMode,
    ) -> UpdateStream {
        if self.config.credential().is_none() {
            warn!("No API key configured");
            return UpdateStream::single(RouterError::MissingCredential.into());
        }
        let Some(turn) = conversation.last() else {
            return UpdateStream::single(RouterError::EmptyConversation.into());
        };

        let intent = classify(turn);
        info!(
            intent = intent.name(),
            personality = %personality,
            messages = conversation.len(),
            "Routing turn"
        );

        match intent {
            Intent::ImageGen { prompt } => self.stream_image(prompt),
            Intent::Vision { prompt, image } => self.vision.stream(prompt, image, personality),
            Intent::Text => self.text.stream(conversation, personality),
        }
    }

    /// Placeholder update, then the image reference or the failure.
    fn stream_image(&self, prompt: &str) -> UpdateStream {
        let (tx, stream) = UpdateStream::channel();
        let image = self.image.clone();
        let prompt = prompt.to_string();

        tokio::spawn(async move {
            if tx.send(StreamUpdate::partial(IMAGE_PENDING_TEXT)).await.is_err() {
                return;
            }

            let update = match image.generate_image(&prompt).await {
                Ok(url) => StreamUpdate::complete(format!("![Generated Image]({})", url)),
                Err(e) => {
                    error!(error = %e, "Image generation failed");
                    StreamUpdate::failure(format!("Error: Visual synthesis failed. {}", e))
                }
            };
            tx.send(update).await.ok();
        });

        stream
    }
}
