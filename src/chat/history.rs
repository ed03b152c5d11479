//! Append-only conversation history for one lane

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    You,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::You => write!(f, "You"),
            Speaker::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One utterance in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Ordered turns of a single (mode, model) conversation.
///
/// There is no way to edit or remove a turn; the only mutation is append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    turns: Vec<Turn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Speaker::You, text);
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Speaker::Assistant, text);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Completed (You, Assistant) exchanges
    pub fn pairs(&self) -> Vec<(&Turn, &Turn)> {
        self.turns
            .windows(2)
            .filter(|w| w[0].speaker == Speaker::You && w[1].speaker == Speaker::Assistant)
            .map(|w| (&w[0], &w[1]))
            .collect()
    }
}
