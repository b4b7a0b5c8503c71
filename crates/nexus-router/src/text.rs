//! Text (reasoning + search) adapter.

use std::sync::Arc;

use nexus_core::{Message, PersonalityMode, Role};
use tracing::{debug, warn};

use crate::config::{ChatBackendConfig, RouterConfig};
use crate::decoder::StreamDecoder;
use crate::error::RouterError;
use crate::stream::UpdateStream;
use crate::types::{ChatRequest, ChatRequestMessage, RequestRole};

/// Streams answers from the text backend over recent history.
#[derive(Debug, Clone)]
pub struct TextAdapter {
    decoder: StreamDecoder,
    config: Arc<RouterConfig>,
}

impl TextAdapter {
    /// Create a text adapter.
    pub fn new(decoder: StreamDecoder, config: Arc<RouterConfig>) -> Self {
        Self { decoder, config }
    }

    /// Stream an answer to the last message of `conversation`.
    pub fn stream(&self, conversation: &[Message], personality: PersonalityMode) -> UpdateStream {
        let Some(api_key) = self.config.credential() else {
            warn!("Text request without credential");
            return UpdateStream::single(RouterError::MissingCredential.into());
        };
        if conversation.is_empty() {
            return UpdateStream::single(RouterError::EmptyConversation.into());
        }

        let now = chrono::Local::now()
            .format("%A, %B %-d, %Y %H:%M (UTC%:z)")
            .to_string();
        let request = build_text_request(
            &self.config.text,
            self.config.history_window,
            conversation,
            personality,
            &now,
        );
        debug!(messages = request.messages.len(), "Built text request");

        self.decoder.open(&self.config.text.endpoint, api_key, request)
    }
}

/// System prompt for the text backend: personality plus the current time.
pub fn text_system_prompt(personality: PersonalityMode, now: &str) -> String {
    format!(
        "{}\n\nThe current date and time is {}. Your knowledge is real-time: treat this as the present moment, and when a question depends on recent events, verify your answer against the live search context before relying on prior knowledge.",
        personality.system_prompt(),
        now
    )
}

/// Build the streaming request for the text backend.
///
/// Only the last `history_window` messages before the active turn are
/// included; older ones are dropped.
pub fn build_text_request(
    backend: &ChatBackendConfig,
    history_window: usize,
    conversation: &[Message],
    personality: PersonalityMode,
    now: &str,
) -> ChatRequest {
    let mut messages = vec![ChatRequestMessage::text(
        RequestRole::System,
        text_system_prompt(personality, now),
    )];

    if let Some((turn, history)) = conversation.split_last() {
        let start = history.len().saturating_sub(history_window);
        messages.extend(
            history[start..]
                .iter()
                .chain(std::iter::once(turn))
                .map(|m| ChatRequestMessage::text(request_role(m.role), content_with_attachments(m))),
        );
    }

    ChatRequest {
        model: backend.model.clone(),
        messages,
        stream: true,
        extra: backend.extra.clone(),
    }
}

fn request_role(role: Role) -> RequestRole {
    match role {
        Role::User => RequestRole::User,
        _ => RequestRole::Assistant,
    }
}

/// Message text followed by every text attachment, each under a marker
/// naming the file.
fn content_with_attachments(message: &Message) -> String {
    let mut content = message.text.clone();
    for attachment in message.text_attachments() {
        content.push_str(&format!(
            "\n\n[Attached file: {}]\n{}",
            attachment.name, attachment.content
        ));
    }
    content
}
