//! Core types for the Gesture Flux classifier
//!
//! This module defines the data structures shared by the classifier, the replay
//! processor and the frame encoder: channel identifiers, per-channel gesture
//! state, the events that drive it, and the serialized frame output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier for one logical input source (e.g. the "x" or "a" button)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Channel(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel(name.to_string())
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Channel(name)
    }
}

/// The three derived semantic states a channel can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Tap,
    Press,
    Hold,
}

impl Gesture {
    pub const ALL: [Gesture; 3] = [Gesture::Tap, Gesture::Press, Gesture::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Tap => "tap",
            Gesture::Press => "press",
            Gesture::Hold => "hold",
        }
    }

    /// Transient gestures decay at every tick; Hold is latched
    pub fn is_transient(&self) -> bool {
        !matches!(self, Gesture::Hold)
    }
}

/// Per-channel gesture flags
///
/// Tap and Press are one-tick pulses and never both true. Hold is latched
/// independently of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GestureState {
    pub tap: bool,
    pub press: bool,
    pub hold: bool,
}

impl GestureState {
    pub const fn new(tap: bool, press: bool, hold: bool) -> Self {
        Self { tap, press, hold }
    }

    pub fn is_active(&self, gesture: Gesture) -> bool {
        match gesture {
            Gesture::Tap => self.tap,
            Gesture::Press => self.press,
            Gesture::Hold => self.hold,
        }
    }

    /// Iterate over the gestures currently set
    pub fn active(&self) -> impl Iterator<Item = Gesture> + '_ {
        Gesture::ALL.into_iter().filter(|g| self.is_active(*g))
    }

    pub fn is_idle(&self) -> bool {
        !(self.tap || self.press || self.hold)
    }

    pub(crate) fn engage(&mut self) {
        self.tap = true;
        self.press = false;
    }

    pub(crate) fn disengage(&mut self) {
        self.tap = false;
        self.press = true;
        self.hold = true;
    }

    pub(crate) fn release_hold(&mut self) {
        self.hold = false;
    }

    pub(crate) fn decay(&mut self) {
        self.tap = false;
        self.press = false;
    }
}

/// Events that mutate a channel's gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureEvent {
    /// Tap-style interaction performed (input engaged)
    Engage,
    /// Tap-style interaction canceled (input released after engagement)
    Disengage,
    /// Hold-style interaction performed on release
    HoldRelease,
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureEvent::Engage => "engage",
            GestureEvent::Disengage => "disengage",
            GestureEvent::HoldRelease => "hold_release",
        }
    }
}

/// Interaction configured on a physical input by the host input library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    /// Short interaction: performed on press, canceled on release
    Tap,
    /// Long interaction: performed on release once held past its threshold
    Hold,
}

/// Phase reported by the host for an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    Started,
    Performed,
    Canceled,
}

impl Interaction {
    /// Map an interaction phase onto the classifier event it implies, if any
    pub fn event_for(&self, phase: InteractionPhase) -> Option<GestureEvent> {
        match (self, phase) {
            (Interaction::Tap, InteractionPhase::Performed) => Some(GestureEvent::Engage),
            (Interaction::Tap, InteractionPhase::Canceled) => Some(GestureEvent::Disengage),
            (Interaction::Hold, InteractionPhase::Performed) => Some(GestureEvent::HoldRelease),
            _ => None,
        }
    }
}

/// State of every tracked channel at the close of one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub channels: BTreeMap<Channel, GestureState>,
}

/// Producer metadata embedded in every frame record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Serialized output record (gesture.frame.v1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub schema_version: String,
    pub producer: FrameProducer,
    pub frame: u64,
    pub computed_at_utc: String,
    pub channels: BTreeMap<Channel, GestureState>,
}
