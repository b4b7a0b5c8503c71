//! Streaming response router for Nexus
//!
//! This crate turns the last message of a conversation into a stream of
//! cumulative [`StreamUpdate`](nexus_core::StreamUpdate)s. Each turn is
//! routed to exactly one backend: image generation when the text asks for
//! a picture, vision when an image is attached, text otherwise.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use nexus_core::{Message, PersonalityMode};
//! use nexus_router::{Router, RouterConfig};
//!
//! async fn chat() {
//!     let router = Router::new(RouterConfig::from_env().with_api_key("sk-..."));
//!     let conversation = vec![Message::user("draw a lighthouse at dusk")];
//!
//!     let mut updates = router.stream_reply(&conversation, PersonalityMode::Zesty);
//!     while let Some(update) = updates.next().await {
//!         if update.is_complete {
//!             println!("{}", update.text);
//!         }
//!     }
//! }
//! ```

mod config;
mod decoder;
mod error;
mod image;
mod intent;
mod router;
mod stream;
mod text;
mod types;
mod vision;

// Re-export main types
pub use config::{ChatBackendConfig, ImageBackendConfig, RouterConfig, DEFAULT_API_BASE};
pub use decoder::{parse_frame, Frame, FrameBuffer, StreamDecoder};
pub use error::RouterError;
pub use image::{extract_image, ImageAdapter};
pub use intent::{
    classify, is_image_generation_request, strip_trigger_phrases, Intent, TRIGGER_PHRASES,
};
pub use router::{Router, IMAGE_PENDING_TEXT};
pub use stream::UpdateStream;
pub use text::{build_text_request, text_system_prompt, TextAdapter};
pub use types::{
    ChatChunk, ChatRequest, ChatRequestMessage, ChunkChoice, ChunkDelta, ContentPart, ImageData,
    ImageRequest, ImageResponse, ImageUrl, MessageContent, RequestRole,
};
pub use vision::{build_vision_request, VisionAdapter};
