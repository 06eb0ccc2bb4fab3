//! Diagnostics hook
//!
//! An observer is notified after every classifier transition. `LogObserver`
//! reports transitions through the `log` facade; `RecordingObserver` keeps
//! them in memory for hosts that want to inspect or assert on them.

use crate::types::{Channel, GestureEvent, GestureState};
use log::Level;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives classifier transitions
pub trait GestureObserver {
    /// Called after `event` has been applied to `channel`
    fn on_transition(&mut self, channel: &Channel, event: GestureEvent, state: GestureState);

    /// Called after a tick has decayed the transient flags of `tracked` channels
    fn on_tick(&mut self, _tracked: usize) {}
}

// Shared handle so a host can keep reading an observer it installed.
impl<T: GestureObserver> GestureObserver for Rc<RefCell<T>> {
    fn on_transition(&mut self, channel: &Channel, event: GestureEvent, state: GestureState) {
        self.borrow_mut().on_transition(channel, event, state);
    }

    fn on_tick(&mut self, tracked: usize) {
        self.borrow_mut().on_tick(tracked);
    }
}

/// Observer that logs each transition
#[derive(Debug, Clone, Copy)]
pub struct LogObserver {
    level: Level,
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(Level::Debug)
    }
}

impl LogObserver {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Ticks happen every frame, so they are logged one level below transitions
    pub fn tick_level(&self) -> Level {
        match self.level {
            Level::Error => Level::Warn,
            Level::Warn => Level::Info,
            Level::Info => Level::Debug,
            Level::Debug | Level::Trace => Level::Trace,
        }
    }
}

impl GestureObserver for LogObserver {
    fn on_transition(&mut self, channel: &Channel, event: GestureEvent, state: GestureState) {
        let label = match event {
            GestureEvent::Engage => "Tap",
            GestureEvent::Disengage => "Pressed",
            GestureEvent::HoldRelease => "Released",
        };
        log::log!(
            self.level,
            "{} on {} (tap={} press={} hold={})",
            label,
            channel,
            state.tap,
            state.press,
            state.hold
        );
    }

    fn on_tick(&mut self, tracked: usize) {
        log::log!(self.tick_level(), "tick decayed {} channels", tracked);
    }
}

/// Observer that records transitions in memory.
///
/// Install it through an `Rc<RefCell<_>>` to read the log back while the
/// classifier still owns the observer.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub transitions: Vec<(Channel, GestureEvent, GestureState)>,
    pub ticks: usize,
}

impl GestureObserver for RecordingObserver {
    fn on_transition(&mut self, channel: &Channel, event: GestureEvent, state: GestureState) {
        self.transitions.push((channel.clone(), event, state));
    }

    fn on_tick(&mut self, _tracked: usize) {
        self.ticks += 1;
    }
}
