//! Router configuration.
//!
//! Built once at startup and handed to [`Router::new`](crate::Router::new);
//! adapters never read the environment themselves.

use serde_json::{json, Map, Value};

use crate::intent::TRIGGER_PHRASES;

/// Default OpenAI-compatible API base.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Settings for one chat/completions-shaped streaming backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatBackendConfig {
    /// Full URL of the chat/completions endpoint.
    pub endpoint: String,

    /// Model name sent in the request body.
    pub model: String,

    /// Provider-specific flags merged into the request body.
    pub extra: Map<String, Value>,
}

impl ChatBackendConfig {
    /// Create a backend with no extra flags.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            extra: Map::new(),
        }
    }

    /// Builder method to add a provider flag.
    pub fn with_flag(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Settings for the single-shot image generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBackendConfig {
    /// Full URL of the image generation endpoint.
    pub endpoint: String,

    /// Model name sent in the request body.
    pub model: String,

    /// Requested resolution, e.g. "1024x1024".
    pub size: String,

    /// Phrases removed from the prompt before it is sent.
    pub strip_phrases: Vec<String>,

    /// Optional CORS relay prefix prepended to the endpoint URL.
    pub relay: Option<String>,
}

impl ImageBackendConfig {
    /// URL the request is actually sent to.
    pub fn request_url(&self) -> String {
        match &self.relay {
            Some(relay) => format!("{}{}", relay, self.endpoint),
            None => self.endpoint.clone(),
        }
    }
}

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bearer credential for every backend.
    pub api_key: Option<String>,

    /// Text (reasoning + search) backend.
    pub text: ChatBackendConfig,

    /// Vision backend.
    pub vision: ChatBackendConfig,

    /// Image generation backend.
    pub image: ImageBackendConfig,

    /// Number of prior messages the text backend sees.
    pub history_window: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::for_api_base(DEFAULT_API_BASE)
    }
}

impl RouterConfig {
    /// Default models on an OpenAI-compatible API rooted at `api_base`.
    pub fn for_api_base(api_base: &str) -> Self {
        let base = api_base.trim_end_matches('/');
        let chat_endpoint = format!("{}/chat/completions", base);

        Self {
            api_key: None,
            text: ChatBackendConfig::new(chat_endpoint.clone(), "gpt-4o-mini-search-preview")
                .with_flag("web_search_options", json!({})),
            vision: ChatBackendConfig::new(chat_endpoint, "gpt-4o"),
            image: ImageBackendConfig {
                endpoint: format!("{}/images/generations", base),
                model: "dall-e-3".to_string(),
                size: "1024x1024".to_string(),
                strip_phrases: TRIGGER_PHRASES.iter().map(|p| p.to_string()).collect(),
                relay: None,
            },
            history_window: 10,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = get("NEXUS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let mut config = Self::for_api_base(&api_base);

        config.api_key = get("NEXUS_API_KEY").or_else(|| get("API_KEY"));
        if let Some(model) = get("NEXUS_TEXT_MODEL") {
            config.text.model = model;
        }
        if let Some(model) = get("NEXUS_VISION_MODEL") {
            config.vision.model = model;
        }
        if let Some(model) = get("NEXUS_IMAGE_MODEL") {
            config.image.model = model;
        }
        if let Some(size) = get("NEXUS_IMAGE_SIZE") {
            config.image.size = size;
        }
        config.image.relay = get("NEXUS_CORS_RELAY");
        config
    }

    /// Builder method to set the credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The credential, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.history_window, 10);
        assert_eq!(config.text.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.image.endpoint, "https://api.openai.com/v1/images/generations");
        assert!(config.text.extra.contains_key("web_search_options"));
        assert!(config.vision.extra.is_empty());
    }

    #[test]
    fn test_from_lookup() {
        let config = RouterConfig::from_lookup(lookup(&[
            ("NEXUS_API_KEY", "sk-test"),
            ("NEXUS_API_BASE", "http://localhost:8080/v1/"),
            ("NEXUS_VISION_MODEL", "llava"),
            ("NEXUS_CORS_RELAY", "https://relay.example/?"),
        ]));

        assert_eq!(config.credential(), Some("sk-test"));
        assert_eq!(config.text.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.vision.model, "llava");
        assert_eq!(
            config.image.request_url(),
            "https://relay.example/?http://localhost:8080/v1/images/generations"
        );
    }

    #[test]
    fn test_api_key_fallback_and_blank_values() {
        let config = RouterConfig::from_lookup(lookup(&[("NEXUS_API_KEY", "  "), ("API_KEY", "legacy")]));
        assert_eq!(config.credential(), Some("legacy"));

        let config = RouterConfig::from_lookup(lookup(&[]));
        assert_eq!(config.credential(), None);
    }

    #[test]
    fn test_blank_key_is_not_a_credential() {
        let config = RouterConfig::default().with_api_key("");
        assert_eq!(config.credential(), None);
    }
}
