//! Gesture classification
//!
//! `GestureClassifier` fuses two host interactions per channel (a short tap
//! interaction and a long hold interaction) into one Tap/Press/Hold state.
//! The host library does all the timing; the classifier only performs the
//! flag algebra, so it is a deterministic function of the event order.
//!
//! Per channel:
//! - Engage: Tap on, Press off
//! - Disengage: Tap off, Press on, Hold on
//! - HoldRelease: Hold off
//! - Tick: Tap off, Press off

use crate::config::{ClassifierConfig, UnknownChannelPolicy};
use crate::error::GestureError;
use crate::observer::GestureObserver;
use crate::types::{Channel, GestureEvent, GestureState, Interaction, InteractionPhase};
use std::collections::{BTreeMap, HashMap};

/// Per-channel Tap/Press/Hold state machine
pub struct GestureClassifier {
    states: HashMap<Channel, GestureState>,
    unknown_channels: UnknownChannelPolicy,
    observer: Option<Box<dyn GestureObserver>>,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureClassifier {
    /// Create a classifier with no channels and auto-registration
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            unknown_channels: UnknownChannelPolicy::AutoRegister,
            observer: None,
        }
    }

    /// Create a classifier with the configured channels pre-registered
    pub fn with_config(config: &ClassifierConfig) -> Self {
        let mut classifier = Self::new();
        classifier.unknown_channels = config.unknown_channels;
        for channel in &config.channels {
            classifier.register(channel.clone());
        }
        classifier
    }

    /// Attach a transition observer
    pub fn with_observer(mut self, observer: impl GestureObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_observer(&mut self, observer: impl GestureObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn unknown_channel_policy(&self) -> UnknownChannelPolicy {
        self.unknown_channels
    }

    /// Start tracking a channel. Returns false if it was already tracked,
    /// in which case its state is left as is.
    pub fn register(&mut self, channel: impl Into<Channel>) -> bool {
        let channel = channel.into();
        if self.states.contains_key(&channel) {
            return false;
        }
        log::debug!("registered channel {}", channel);
        self.states.insert(channel, GestureState::default());
        true
    }

    /// Stop tracking a channel, returning its final state
    pub fn unregister(&mut self, channel: &Channel) -> Option<GestureState> {
        let removed = self.states.remove(channel);
        if removed.is_some() {
            log::debug!("unregistered channel {}", channel);
        }
        removed
    }

    pub fn is_registered(&self, channel: &Channel) -> bool {
        self.states.contains_key(channel)
    }

    /// Tracked channels in name order
    pub fn channels(&self) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.states.keys().collect();
        channels.sort();
        channels
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Tap interaction performed: the input was engaged.
    pub fn on_engage_detected(&mut self, channel: impl Into<Channel>) -> GestureState {
        self.dispatch(channel, GestureEvent::Engage)
    }

    /// Tap interaction canceled: the input was released. Arms Hold.
    pub fn on_disengage_detected(&mut self, channel: impl Into<Channel>) -> GestureState {
        self.dispatch(channel, GestureEvent::Disengage)
    }

    /// Hold interaction performed on release: clears the Hold latch.
    pub fn on_hold_release_detected(&mut self, channel: impl Into<Channel>) -> GestureState {
        self.dispatch(channel, GestureEvent::HoldRelease)
    }

    /// Apply an event, registering the channel if needed. Returns the new state.
    pub fn dispatch(&mut self, channel: impl Into<Channel>, event: GestureEvent) -> GestureState {
        let channel = channel.into();
        if !self.states.contains_key(&channel) {
            log::debug!("auto-registered channel {}", channel);
        }
        let state = self.states.entry(channel.clone()).or_default();
        match event {
            GestureEvent::Engage => state.engage(),
            GestureEvent::Disengage => state.disengage(),
            GestureEvent::HoldRelease => state.release_hold(),
        }
        let state = *state;

        if let Some(observer) = self.observer.as_mut() {
            observer.on_transition(&channel, event, state);
        }
        state
    }

    /// Apply an event under the configured unknown-channel policy
    pub fn apply(
        &mut self,
        channel: &Channel,
        event: GestureEvent,
    ) -> Result<GestureState, GestureError> {
        self.admit(channel, event)?;
        Ok(self.dispatch(channel.clone(), event))
    }

    /// Check an event against the unknown-channel policy without applying it
    pub fn admit(&self, channel: &Channel, event: GestureEvent) -> Result<(), GestureError> {
        if self.unknown_channels == UnknownChannelPolicy::Reject && !self.is_registered(channel) {
            log::warn!("rejected {} for unknown channel {}", event.as_str(), channel);
            return Err(GestureError::UnknownChannel(channel.to_string()));
        }
        Ok(())
    }

    /// Route a host interaction phase. Phases that carry no meaning for the
    /// classifier are ignored and return `None`.
    pub fn on_interaction(
        &mut self,
        channel: impl Into<Channel>,
        interaction: Interaction,
        phase: InteractionPhase,
    ) -> Option<GestureState> {
        let event = interaction.event_for(phase)?;
        Some(self.dispatch(channel, event))
    }

    /// End of frame: decay Tap and Press on every channel. Hold is kept.
    pub fn tick(&mut self) {
        for state in self.states.values_mut() {
            state.decay();
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_tick(self.states.len());
        }
    }

    /// Current state of a channel; untracked channels read as all-false
    pub fn state(&self, channel: &Channel) -> GestureState {
        self.get(channel).unwrap_or_default()
    }

    /// Current state of a channel, or `None` if it is not tracked
    pub fn get(&self, channel: &Channel) -> Option<GestureState> {
        self.states.get(channel).copied()
    }

    /// States of every tracked channel, ordered by channel
    pub fn snapshot(&self) -> BTreeMap<Channel, GestureState> {
        self.states
            .iter()
            .map(|(channel, state)| (channel.clone(), *state))
            .collect()
    }
}
