//! Intent detection for an incoming turn.
//!
//! Classification is plain case-insensitive substring matching, so phrases
//! like "draw conclusions" or "withdrawal" count as image requests. That
//! is accepted behavior.

use nexus_core::{Attachment, Message, Role};

/// Phrases that mark a turn as an image generation request.
pub const TRIGGER_PHRASES: [&str; 7] = [
    "generate image",
    "create image",
    "draw",
    "paint",
    "visualize",
    "generate a picture",
    "make a picture",
];

/// Returns true if `text` contains any trigger phrase, ignoring case.
pub fn is_image_generation_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TRIGGER_PHRASES.iter().any(|t| lowered.contains(t))
}

/// Backend selected for a turn, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a> {
    /// Single-shot image synthesis from the turn's text.
    ImageGen { prompt: &'a str },
    /// Streaming answer about an attached image.
    Vision {
        prompt: &'a str,
        image: &'a Attachment,
    },
    /// Streaming text answer over the recent history.
    Text,
}

impl Intent<'_> {
    /// Short name for logs and UI indicators.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImageGen { .. } => "image-gen",
            Self::Vision { .. } => "vision",
            Self::Text => "text",
        }
    }

    /// Role of the reply placeholder while this backend works.
    pub fn pending_role(&self) -> Role {
        match self {
            Self::ImageGen { .. } => Role::ImageGen,
            Self::Vision { .. } => Role::Typing,
            Self::Text => Role::Searching,
        }
    }
}

/// Pick the backend for the active turn: image-gen > vision > text.
pub fn classify(turn: &Message) -> Intent<'_> {
    if is_image_generation_request(&turn.text) {
        return Intent::ImageGen { prompt: &turn.text };
    }
    match turn.image_attachment() {
        Some(image) => Intent::Vision {
            prompt: &turn.text,
            image,
        },
        None => Intent::Text,
    }
}

/// Remove trigger phrases from an image prompt, ignoring ASCII case.
///
/// Whitespace is collapsed afterwards. If nothing is left the trimmed
/// original text is returned.
pub fn strip_trigger_phrases(text: &str, phrases: &[String]) -> String {
    let mut cleaned = text.to_string();
    for phrase in phrases {
        let needle = phrase.to_ascii_lowercase();
        if needle.is_empty() {
            continue;
        }
        // ASCII lowercasing keeps byte offsets aligned with `cleaned`.
        while let Some(start) = cleaned.to_ascii_lowercase().find(&needle) {
            cleaned.replace_range(start..start + needle.len(), "");
        }
    }

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        text.trim().to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> Vec<String> {
        TRIGGER_PHRASES.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_trigger_detection() {
        assert!(is_image_generation_request("Draw a cat"));
        assert!(is_image_generation_request("please GENERATE IMAGE of a fox"));
        assert!(is_image_generation_request("Can you Visualize this?"));
        assert!(is_image_generation_request("make a picture of the sea"));
        assert!(!is_image_generation_request("hello"));
        assert!(!is_image_generation_request("generate an essay"));
    }

    #[test]
    fn test_substring_false_positives_are_kept() {
        assert!(is_image_generation_request("withdrawal"));
        assert!(is_image_generation_request("let's draw conclusions"));
    }

    #[test]
    fn test_every_trigger_in_any_casing() {
        for trigger in TRIGGER_PHRASES {
            assert!(is_image_generation_request(trigger));
            assert!(is_image_generation_request(&trigger.to_uppercase()));
            assert!(is_image_generation_request(&format!("x {} y", trigger)));
        }
    }

    #[test]
    fn test_pending_role_per_intent() {
        let image = Attachment::image("a.png", "data:image/png;base64,aGVsbG8=");
        let draw = Message::user("draw a boat");
        let look = Message::user("what is this?").with_attachment(image);
        let ask = Message::user("latest rust release?");

        assert_eq!(classify(&draw).pending_role(), Role::ImageGen);
        assert_eq!(classify(&look).pending_role(), Role::Typing);
        assert_eq!(classify(&ask).pending_role(), Role::Searching);
    }

    #[test]
    fn test_classify_priority() {
        let image = Attachment::image("a.png", "data:image/png;base64,aGVsbG8=");

        let both = Message::user("draw this again").with_attachment(image.clone());
        assert!(matches!(classify(&both), Intent::ImageGen { .. }));

        let vision = Message::user("what is in this picture?").with_attachment(image);
        assert!(matches!(classify(&vision), Intent::Vision { image, .. } if image.name == "a.png"));

        let text = Message::user("hello").with_attachment(Attachment::text("a.txt", "x"));
        assert_eq!(classify(&text), Intent::Text);
        assert_eq!(classify(&text).name(), "text");
    }

    #[test]
    fn test_strip_trigger_phrases() {
        assert_eq!(
            strip_trigger_phrases("Draw a cat on a skateboard", &phrases()),
            "a cat on a skateboard"
        );
        assert_eq!(
            strip_trigger_phrases("please GENERATE IMAGE   of a red fox", &phrases()),
            "please of a red fox"
        );
    }

    #[test]
    fn test_strip_falls_back_to_original() {
        assert_eq!(strip_trigger_phrases("  draw  ", &phrases()), "draw");
    }

    #[test]
    fn test_strip_preserves_non_ascii() {
        assert_eq!(
            strip_trigger_phrases("paint a café at dusk ☕", &phrases()),
            "a café at dusk ☕"
        );
    }
}
