//! Classifier configuration
//!
//! Configuration is plain serde data so it can be loaded from a JSON file by the
//! CLI or built in code by a host.

use crate::error::GestureError;
use crate::types::Channel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What the policy-aware `apply` path does with an event for an untracked channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownChannelPolicy {
    /// Register the channel with an all-false state, then apply the event
    #[default]
    AutoRegister,
    /// Refuse the event with `GestureError::UnknownChannel`
    Reject,
}

/// Default bound on the number of idle frames filled between two active frames
pub const DEFAULT_MAX_IDLE_GAP: u64 = 3600;

/// Classifier and replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Channels registered at construction
    pub channels: Vec<Channel>,
    /// Handling of events for channels that are not registered
    pub unknown_channels: UnknownChannelPolicy,
    /// Emit snapshots for frames without events between two active frames
    pub emit_idle_frames: bool,
    /// Largest run of idle frames the replay will fill in one step
    pub max_idle_gap: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            unknown_channels: UnknownChannelPolicy::default(),
            emit_idle_frames: false,
            max_idle_gap: DEFAULT_MAX_IDLE_GAP,
        }
    }
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-registered channel
    pub fn with_channel(mut self, channel: impl Into<Channel>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn with_unknown_channels(mut self, policy: UnknownChannelPolicy) -> Self {
        self.unknown_channels = policy;
        self
    }

    pub fn with_idle_frames(mut self, emit: bool) -> Self {
        self.emit_idle_frames = emit;
        self
    }

    pub fn with_max_idle_gap(mut self, frames: u64) -> Self {
        self.max_idle_gap = frames;
        self
    }

    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let config: ClassifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, GestureError> {
        serde_json::to_string_pretty(self).map_err(|e| GestureError::EncodingError(e.to_string()))
    }

    /// Reject empty or duplicate channel names
    pub fn validate(&self) -> Result<(), GestureError> {
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.is_empty() {
                return Err(GestureError::ConfigError(
                    "channel names must not be empty".to_string(),
                ));
            }
            if !seen.insert(channel) {
                return Err(GestureError::ConfigError(format!(
                    "duplicate channel: {}",
                    channel
                )));
            }
        }
        Ok(())
    }
}
