//! UI-agnostic conversation state types
//!
//! These are the values the conversation controller hands to whatever front end
//! is rendering it (terminal UI today). None of them depend on a UI framework.

use serde::{Deserialize, Serialize};

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// The latest generated website source plus the model's explanation of it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub html: String,
    pub css: String,
    pub javascript: String,
    pub explanation: String,
}

impl GeneratedArtifact {
    /// A reply only counts as new source when both markup and styles are present.
    /// Pure Q&A replies leave these empty.
    pub fn has_source(&self) -> bool {
        !self.html.is_empty() && !self.css.is_empty()
    }
}
