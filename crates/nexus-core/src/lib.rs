//! Nexus Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime specifics
//! - Any particular UI
//!
//! Everything the router consumes (messages, attachments, personalities)
//! and everything it produces (stream updates) lives here.

pub mod attachment;
pub mod chat;
pub mod conversation;
pub mod error;
pub mod ids;
pub mod personality;
pub mod update;

// Re-export commonly used types
pub use attachment::{Attachment, AttachmentKind, DataUri};
pub use chat::{Message, Role};
pub use conversation::{Conversation, GREETING};
pub use error::CoreError;
pub use ids::MessageId;
pub use personality::PersonalityMode;
pub use update::StreamUpdate;
