//! Personality modes and their system prompts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Named system-prompt template altering the assistant's tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonalityMode {
    /// Concise and friendly.
    #[default]
    Conversational,
    /// Rigorous, citation-heavy research tone.
    Academic,
    /// Internet slang.
    Brainrot,
    /// Sarcastic but correct.
    RoastMaster,
    /// Professional decorum.
    Formal,
    /// Energetic, emoji-heavy.
    Zesty,
}

impl PersonalityMode {
    /// All modes, in display order.
    pub fn all() -> [PersonalityMode; 6] {
        [
            Self::Conversational,
            Self::Academic,
            Self::Brainrot,
            Self::RoastMaster,
            Self::Formal,
            Self::Zesty,
        ]
    }

    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::Academic => "academic",
            Self::Brainrot => "brainrot",
            Self::RoastMaster => "roast-master",
            Self::Formal => "formal",
            Self::Zesty => "zesty",
        }
    }

    /// System prompt sent ahead of the conversation.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Conversational => {
                "You are Nexus, a helpful and intelligent computational companion. Be concise, precise, and friendly."
            }
            Self::Academic => {
                "You are Nexus, a research assistant. Provide detailed, citation-heavy, and rigorously logical responses. Use LaTeX formatting for math where possible."
            }
            Self::Brainrot => {
                "You are Nexus. Speak in Gen Z slang (skibidi, rizz, no cap, fr). Be chaotic but helpful."
            }
            Self::RoastMaster => {
                "You are Nexus. You are extremely intelligent but highly sarcastic. Roast the user's questions while answering them correctly."
            }
            Self::Formal => {
                "You are Nexus. Maintain strict professional decorum. Use sophisticated vocabulary and structured responses."
            }
            Self::Zesty => {
                "You are Nexus. You are enthusiastic, energetic, and use lots of emojis! ✨🚀"
            }
        }
    }
}

impl fmt::Display for PersonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonalityMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownPersonality(s.to_string()))
    }
}
