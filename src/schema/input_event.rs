//! gesture.input_event.v1 schema definition
//!
//! Records carry:
//! - the frame (tick index) they belong to
//! - the channel they target
//! - the event kind (engage, disengage, hold_release, or an explicit tick)

use crate::types::{Channel, GestureEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "gesture.input_event.v1";

/// Kind of input record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Engage,
    Disengage,
    HoldRelease,
    /// Closes the record's frame
    Tick,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Engage => "engage",
            EventKind::Disengage => "disengage",
            EventKind::HoldRelease => "hold_release",
            EventKind::Tick => "tick",
        }
    }

    /// Classifier event for this kind; `None` for ticks
    pub fn gesture_event(&self) -> Option<GestureEvent> {
        match self {
            EventKind::Engage => Some(GestureEvent::Engage),
            EventKind::Disengage => Some(GestureEvent::Disengage),
            EventKind::HoldRelease => Some(GestureEvent::HoldRelease),
            EventKind::Tick => None,
        }
    }
}

impl From<GestureEvent> for EventKind {
    fn from(event: GestureEvent) -> Self {
        match event {
            GestureEvent::Engage => EventKind::Engage,
            GestureEvent::Disengage => EventKind::Disengage,
            GestureEvent::HoldRelease => EventKind::HoldRelease,
        }
    }
}

/// The gesture.input_event.v1 record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEvent {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique event identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Frame (tick index) the event belongs to
    pub frame: u64,
    /// Host timestamp, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Target channel; ignored for ticks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Record kind
    pub kind: EventKind,
}

impl InputEvent {
    fn new(frame: u64, channel: Option<Channel>, kind: EventKind) -> Self {
        InputEvent {
            schema_version: SCHEMA_VERSION.to_string(),
            event_id: Some(uuid::Uuid::new_v4().to_string()),
            frame,
            timestamp: None,
            channel,
            kind,
        }
    }

    pub fn engage(frame: u64, channel: impl Into<Channel>) -> Self {
        Self::new(frame, Some(channel.into()), EventKind::Engage)
    }

    pub fn disengage(frame: u64, channel: impl Into<Channel>) -> Self {
        Self::new(frame, Some(channel.into()), EventKind::Disengage)
    }

    pub fn hold_release(frame: u64, channel: impl Into<Channel>) -> Self {
        Self::new(frame, Some(channel.into()), EventKind::HoldRelease)
    }

    /// Explicit end-of-frame marker
    pub fn tick(frame: u64) -> Self {
        Self::new(frame, None, EventKind::Tick)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.kind == EventKind::Tick {
            return Ok(());
        }

        match &self.channel {
            Some(channel) if !channel.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingChannel {
                kind: self.kind.as_str().to_string(),
            }),
        }
    }
}

/// Validation errors for input records
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Missing or empty channel for {kind} event")]
    MissingChannel { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_engage_event() {
        let event = InputEvent::engage(3, "x");
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("gesture.input_event.v1"));
        assert!(json.contains("\"kind\":\"engage\""));
        assert!(json.contains("\"channel\":\"x\""));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_deserialize_minimal_event() {
        let json = r#"{
            "schema_version": "gesture.input_event.v1",
            "frame": 7,
            "channel": "a",
            "kind": "hold_release"
        }"#;

        let event: InputEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.frame, 7);
        assert_eq!(event.channel, Some(Channel::from("a")));
        assert_eq!(event.kind, EventKind::HoldRelease);
        assert!(event.event_id.is_none());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_timestamp() {
        let json = r#"{
            "schema_version": "gesture.input_event.v1",
            "frame": 1,
            "timestamp": "2024-01-15T08:30:00Z",
            "channel": "x",
            "kind": "engage"
        }"#;

        let event: InputEvent = serde_json::from_str(json).unwrap();
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn test_tick_needs_no_channel() {
        let event = InputEvent::tick(4);
        assert!(event.channel.is_none());
        assert!(event.validate().is_ok());
        assert_eq!(event.kind.gesture_event(), None);
    }

    #[test]
    fn test_validation_wrong_version() {
        let mut event = InputEvent::disengage(0, "x");
        event.schema_version = "gesture.input_event.v0".to_string();
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validation_missing_channel() {
        let mut event = InputEvent::engage(0, "x");
        event.channel = None;
        assert!(matches!(
            event.validate(),
            Err(ValidationError::MissingChannel { .. })
        ));

        event.channel = Some(Channel::from(""));
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_event_kind_mapping() {
        for event in [
            GestureEvent::Engage,
            GestureEvent::Disengage,
            GestureEvent::HoldRelease,
        ] {
            assert_eq!(EventKind::from(event).gesture_event(), Some(event));
        }
    }

    #[test]
    fn test_unique_event_ids() {
        let first = InputEvent::engage(0, "x");
        let second = InputEvent::engage(0, "x");
        assert_ne!(first.event_id, second.event_id);
    }
}
