//! Session manager for the chat lanes
//!
//! Holds one append-only history per (mode, model) lane plus the lane the
//! user is currently typing into. Lanes are created in tab order: for each
//! model, the plain lane then the augmented lane.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chat::history::ChatHistory;
use crate::chat::mode::{ChatMode, LaneKey};
use crate::config::ChatConfig;

/// A lane and its conversation
#[derive(Debug, Clone)]
pub struct Lane {
    pub key: LaneKey,
    pub history: ChatHistory,
}

/// Session state shared by the REPL and one-shot commands
pub struct SessionManager {
    id: Uuid,
    lanes: Vec<Lane>,
    active: usize,
    session_start: DateTime<Utc>,
    /// Completed assistant replies across all lanes
    reply_count: usize,
}

impl SessionManager {
    /// Create lanes for `models`; the first plain lane is active.
    /// An empty list gets the default models, so there is always an active lane.
    pub fn new(models: &[String]) -> Self {
        let defaults;
        let models = if models.is_empty() {
            defaults = ChatConfig::default().models;
            defaults.as_slice()
        } else {
            models
        };

        let mut session = SessionManager {
            id: Uuid::new_v4(),
            lanes: Vec::with_capacity(models.len() * 2),
            active: 0,
            session_start: Utc::now(),
            reply_count: 0,
        };
        for model in models {
            session.ensure_model(model);
        }
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Index of `key`, if the lane exists
    pub fn position(&self, key: &LaneKey) -> Option<usize> {
        self.lanes.iter().position(|lane| &lane.key == key)
    }

    /// Add both lanes for `model` if missing; returns the plain lane index
    pub fn ensure_model(&mut self, model: &str) -> usize {
        let plain = LaneKey::new(ChatMode::Plain, model);
        if let Some(idx) = self.position(&plain) {
            return idx;
        }
        let idx = self.lanes.len();
        self.lanes.push(Lane { key: plain, history: ChatHistory::new() });
        self.lanes.push(Lane {
            key: LaneKey::new(ChatMode::Augmented, model),
            history: ChatHistory::new(),
        });
        idx
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_key(&self) -> &LaneKey {
        &self.lanes[self.active].key
    }

    pub fn active_lane(&self) -> &Lane {
        &self.lanes[self.active]
    }

    /// Switch by 0-based index; false when out of range
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.lanes.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Keep the model, change the mode
    pub fn set_mode(&mut self, mode: ChatMode) {
        let key = LaneKey::new(mode, self.active_key().model.clone());
        if let Some(idx) = self.position(&key) {
            self.active = idx;
        }
    }

    /// Keep the mode, change the model (lanes are created on first use)
    pub fn set_model(&mut self, model: &str) {
        let mode = self.active_key().mode;
        self.ensure_model(model);
        self.set_mode_for(mode, model);
    }

    fn set_mode_for(&mut self, mode: ChatMode, model: &str) {
        if let Some(idx) = self.position(&LaneKey::new(mode, model)) {
            self.active = idx;
        }
    }

    /// History for `key`, creating the model's lanes when needed
    pub fn history_mut(&mut self, key: &LaneKey) -> &mut ChatHistory {
        let idx = match self.position(key) {
            Some(idx) => idx,
            None => {
                self.ensure_model(&key.model);
                self.position(key).unwrap_or(0)
            }
        };
        &mut self.lanes[idx].history
    }

    pub fn history(&self, key: &LaneKey) -> Option<&ChatHistory> {
        self.position(key).map(|idx| &self.lanes[idx].history)
    }

    /// Append the user's side of a turn
    pub fn record_user(&mut self, key: &LaneKey, text: &str) {
        self.history_mut(key).push_user(text);
    }

    /// Append the assistant's side of a turn
    pub fn record_assistant(&mut self, key: &LaneKey, text: &str) {
        self.history_mut(key).push_assistant(text);
        self.reply_count += 1;
    }

    /// Start a fresh history for the active lane
    /// Fresh histories everywhere, new session id
    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.history = ChatHistory::new();
        }
        self.id = Uuid::new_v4();
        self.reply_count = 0;
        self.session_start = Utc::now();
    }

    pub fn reply_count(&self) -> usize {
        self.reply_count
    }

    /// Session duration in seconds
    pub fn session_duration(&self) -> u64 {
        (Utc::now() - self.session_start).num_seconds().max(0) as u64
    }

    /// Check if any lane has turns
    pub fn has_context(&self) -> bool {
        self.lanes.iter().any(|lane| !lane.history.is_empty())
    }
}
