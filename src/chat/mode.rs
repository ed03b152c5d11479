//! Chat modes, lane keys and per-model prompting policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ChatConfig;

/// Whether a lane sends the bare query or the retrieval-augmented one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Control: the model sees only the user's text
    Plain,
    /// Test: the model sees the text plus the best reference passage
    Augmented,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Plain => "plain",
            ChatMode::Augmented => "augmented",
        }
    }

    /// Experiment role shown in lane headers
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::Plain => "CONTROL",
            ChatMode::Augmented => "TEST",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ChatMode::Plain => ChatMode::Augmented,
            ChatMode::Augmented => ChatMode::Plain,
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "control" | "p" => Ok(ChatMode::Plain),
            "augmented" | "rag" | "test" | "a" => Ok(ChatMode::Augmented),
            other => Err(format!("unknown mode '{}' (expected plain or augmented)", other)),
        }
    }
}

/// One conversation: a mode paired with a model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaneKey {
    pub mode: ChatMode,
    pub model: String,
}

impl LaneKey {
    pub fn new(mode: ChatMode, model: impl Into<String>) -> Self {
        Self { mode, model: model.into() }
    }

    /// Header in the style "TEST: gpt-4o + RAG"
    pub fn title(&self) -> String {
        match self.mode {
            ChatMode::Plain => format!("{}: {}", self.mode.label(), self.model),
            ChatMode::Augmented => format!("{}: {} + RAG", self.mode.label(), self.model),
        }
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mode, self.model)
    }
}

/// How a given model is prompted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    pub name: String,
    /// `None` for models that reject a system message
    pub system_instruction: Option<String>,
}

impl ModelProfile {
    /// Apply the configured system-message policy to `model`
    pub fn resolve(model: &str, config: &ChatConfig) -> Self {
        let rejects_system = config
            .no_system_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && model.starts_with(prefix.as_str()));

        Self {
            name: model.to_string(),
            system_instruction: if rejects_system {
                None
            } else {
                Some(config.system_instruction.clone())
            },
        }
    }
}
