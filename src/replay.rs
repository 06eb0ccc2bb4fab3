//! Frame replay
//!
//! `FrameReplay` drives a classifier from a stream of input records. Records
//! are grouped by frame number. A frame closes when a record for a later
//! frame arrives, when an explicit tick record for it arrives, or when the
//! stream ends. Closing a frame takes a snapshot of every channel and then
//! ticks the classifier, so the snapshot shows the flags set during that
//! frame and the tick reset is always the last step of the frame.

use crate::classifier::GestureClassifier;
use crate::config::ClassifierConfig;
use crate::error::GestureError;
use crate::schema::{EventKind, InputEvent};
use crate::types::FrameSnapshot;

/// Replays input records frame by frame
pub struct FrameReplay {
    classifier: GestureClassifier,
    open_frame: Option<u64>,
    last_closed: Option<u64>,
    emit_idle_frames: bool,
    max_idle_gap: u64,
}

impl Default for FrameReplay {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl FrameReplay {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            classifier: GestureClassifier::with_config(config),
            open_frame: None,
            last_closed: None,
            emit_idle_frames: config.emit_idle_frames,
            max_idle_gap: config.max_idle_gap,
        }
    }

    /// Replay on top of an existing classifier. Only the idle-frame settings
    /// of `config` are used.
    pub fn with_classifier(classifier: GestureClassifier, config: &ClassifierConfig) -> Self {
        Self {
            classifier,
            open_frame: None,
            last_closed: None,
            emit_idle_frames: config.emit_idle_frames,
            max_idle_gap: config.max_idle_gap,
        }
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut GestureClassifier {
        &mut self.classifier
    }

    pub fn into_classifier(self) -> GestureClassifier {
        self.classifier
    }

    /// Frame currently accepting events
    pub fn open_frame(&self) -> Option<u64> {
        self.open_frame
    }

    pub fn last_closed_frame(&self) -> Option<u64> {
        self.last_closed
    }

    /// Feed one record. Returns the snapshots of any frames it closed.
    ///
    /// A record that is refused leaves the replay untouched: no frame is
    /// closed and no classifier state changes.
    pub fn push(&mut self, event: &InputEvent) -> Result<Vec<FrameSnapshot>, GestureError> {
        event
            .validate()
            .map_err(|e| GestureError::ParseError(format!("Invalid event: {}", e)))?;

        let frame = event.frame;
        if let Some(previous) = self.last_closed {
            if frame <= previous {
                return Err(GestureError::OutOfOrderFrame { previous, got: frame });
            }
        }
        if let Some(open) = self.open_frame {
            if frame < open {
                return Err(GestureError::OutOfOrderFrame { previous: open, got: frame });
            }
        }
        self.check_idle_gap(frame)?;

        // validate() guarantees a channel on every non-tick record
        let transition = match (event.kind.gesture_event(), &event.channel) {
            (Some(gesture_event), Some(channel)) => {
                self.classifier.admit(channel, gesture_event)?;
                Some((channel, gesture_event))
            }
            _ => None,
        };

        let mut closed = Vec::new();
        if self.open_frame != Some(frame) {
            if let Some(open) = self.open_frame {
                closed.push(self.close_frame(open));
            }
            self.fill_idle_frames(frame, &mut closed);
            self.open_frame = Some(frame);
        }

        if let Some((channel, gesture_event)) = transition {
            self.classifier.dispatch(channel.clone(), gesture_event);
        }
        if event.kind == EventKind::Tick {
            closed.push(self.close_frame(frame));
        }

        Ok(closed)
    }

    /// Feed a batch of records
    pub fn push_all<'a, I>(&mut self, events: I) -> Result<Vec<FrameSnapshot>, GestureError>
    where
        I: IntoIterator<Item = &'a InputEvent>,
    {
        let mut closed = Vec::new();
        for event in events {
            closed.extend(self.push(event)?);
        }
        Ok(closed)
    }

    /// Close the open frame, if any
    pub fn finish(&mut self) -> Option<FrameSnapshot> {
        let frame = self.open_frame?;
        Some(self.close_frame(frame))
    }

    fn close_frame(&mut self, frame: u64) -> FrameSnapshot {
        let snapshot = FrameSnapshot {
            frame,
            channels: self.classifier.snapshot(),
        };
        self.classifier.tick();
        self.open_frame = None;
        self.last_closed = Some(frame);
        snapshot
    }

    // Idle frames that opening `next` would fill, measured from the open frame
    // or, failing that, the last closed one.
    fn check_idle_gap(&self, next: u64) -> Result<(), GestureError> {
        if !self.emit_idle_frames || self.open_frame == Some(next) {
            return Ok(());
        }
        let from = match self.open_frame.or(self.last_closed) {
            Some(from) => from,
            None => return Ok(()),
        };
        let gap = next.saturating_sub(from).saturating_sub(1);
        if gap > self.max_idle_gap {
            return Err(GestureError::IdleGapTooLarge {
                from,
                to: next,
                gap,
                limit: self.max_idle_gap,
            });
        }
        Ok(())
    }

    // Frames strictly between the last closed frame and `next` saw no events.
    fn fill_idle_frames(&mut self, next: u64, closed: &mut Vec<FrameSnapshot>) {
        if !self.emit_idle_frames {
            return;
        }
        if let Some(last) = self.last_closed {
            for frame in (last + 1)..next {
                closed.push(self.close_frame(frame));
            }
        }
    }
}

/// Replay a complete event list and return every frame snapshot
pub fn replay_events(
    events: &[InputEvent],
    config: &ClassifierConfig,
) -> Result<Vec<FrameSnapshot>, GestureError> {
    let mut replay = FrameReplay::new(config);
    let mut snapshots = replay.push_all(events)?;
    snapshots.extend(replay.finish());
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownChannelPolicy;
    use crate::types::{Channel, GestureState};
    use pretty_assertions::assert_eq;

    fn state_of(snapshot: &FrameSnapshot, channel: &str) -> GestureState {
        snapshot.channels[&Channel::from(channel)]
    }

    #[test]
    fn test_snapshot_taken_before_tick() {
        let events = vec![InputEvent::engage(0, "x"), InputEvent::tick(1)];
        let snapshots = replay_events(&events, &ClassifierConfig::default()).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].frame, 0);
        assert_eq!(state_of(&snapshots[0], "x"), GestureState::new(true, false, false));
        assert_eq!(state_of(&snapshots[1], "x"), GestureState::new(false, false, false));
    }

    #[test]
    fn test_hold_survives_frames() {
        let events = vec![
            InputEvent::engage(0, "x"),
            InputEvent::disengage(3, "x"),
            InputEvent::tick(4),
            InputEvent::hold_release(5, "x"),
        ];
        let snapshots = replay_events(&events, &ClassifierConfig::default()).unwrap();

        let frames: Vec<u64> = snapshots.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 3, 4, 5]);
        assert_eq!(state_of(&snapshots[1], "x"), GestureState::new(false, true, true));
        assert_eq!(state_of(&snapshots[2], "x"), GestureState::new(false, false, true));
        assert_eq!(state_of(&snapshots[3], "x"), GestureState::new(false, false, false));
    }

    #[test]
    fn test_events_within_frame_accumulate() {
        let events = vec![
            InputEvent::engage(2, "x"),
            InputEvent::disengage(2, "x"),
            InputEvent::engage(2, "a"),
        ];
        let snapshots = replay_events(&events, &ClassifierConfig::default()).unwrap();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(state_of(&snapshots[0], "x"), GestureState::new(false, true, true));
        assert_eq!(state_of(&snapshots[0], "a"), GestureState::new(true, false, false));
    }

    #[test]
    fn test_idle_frames_emitted_when_configured() {
        let config = ClassifierConfig::new().with_idle_frames(true);
        let events = vec![InputEvent::disengage(1, "x"), InputEvent::engage(4, "x")];
        let snapshots = replay_events(&events, &config).unwrap();

        let frames: Vec<u64> = snapshots.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![1, 2, 3, 4]);
        assert_eq!(state_of(&snapshots[1], "x"), GestureState::new(false, false, true));
        assert_eq!(state_of(&snapshots[3], "x"), GestureState::new(true, false, true));
    }

    #[test]
    fn test_idle_frames_skipped_by_default() {
        let events = vec![InputEvent::disengage(1, "x"), InputEvent::engage(4, "x")];
        let snapshots = replay_events(&events, &ClassifierConfig::default()).unwrap();
        assert_eq!(snapshots.len(), 2);
    }

    #[test]
    fn test_out_of_order_frame_rejected() {
        let mut replay = FrameReplay::default();
        replay.push(&InputEvent::engage(5, "x")).unwrap();
        let err = replay.push(&InputEvent::engage(4, "x")).unwrap_err();
        assert!(matches!(err, GestureError::OutOfOrderFrame { previous: 5, got: 4 }));
    }

    #[test]
    fn test_closed_frame_cannot_reopen() {
        let mut replay = FrameReplay::default();
        replay.push(&InputEvent::engage(5, "x")).unwrap();
        replay.push(&InputEvent::tick(5)).unwrap();
        let err = replay.push(&InputEvent::disengage(5, "x")).unwrap_err();
        assert!(matches!(err, GestureError::OutOfOrderFrame { previous: 5, got: 5 }));
    }

    #[test]
    fn test_reject_policy_propagates() {
        let config = ClassifierConfig::new()
            .with_channel("x")
            .with_unknown_channels(UnknownChannelPolicy::Reject);
        let events = vec![InputEvent::engage(0, "x"), InputEvent::engage(0, "b")];
        let result = replay_events(&events, &config);
        assert!(matches!(result, Err(GestureError::UnknownChannel(_))));
    }

    #[test]
    fn test_rejected_event_keeps_open_frame() {
        let config = ClassifierConfig::new()
            .with_channel("x")
            .with_unknown_channels(UnknownChannelPolicy::Reject);
        let mut replay = FrameReplay::new(&config);
        replay.push(&InputEvent::engage(0, "x")).unwrap();

        let result = replay.push(&InputEvent::engage(1, "b"));
        assert!(matches!(result, Err(GestureError::UnknownChannel(name)) if name == "b"));
        assert_eq!(replay.open_frame(), Some(0));
        assert_eq!(replay.last_closed_frame(), None);
        assert_eq!(
            replay.classifier().state(&Channel::from("x")),
            GestureState::new(true, false, false)
        );

        let frame0 = replay.finish().unwrap();
        assert_eq!(frame0.frame, 0);
        assert_eq!(state_of(&frame0, "x"), GestureState::new(true, false, false));
    }

    #[test]
    fn test_replay_continues_after_rejected_event() {
        let config = ClassifierConfig::new()
            .with_channel("x")
            .with_unknown_channels(UnknownChannelPolicy::Reject);
        let mut replay = FrameReplay::new(&config);
        replay.push(&InputEvent::engage(0, "x")).unwrap();
        assert!(replay.push(&InputEvent::engage(1, "b")).is_err());

        let closed = replay.push(&InputEvent::disengage(1, "x")).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(state_of(&closed[0], "x"), GestureState::new(true, false, false));
        assert_eq!(replay.open_frame(), Some(1));
    }

    #[test]
    fn test_idle_gap_over_limit_rejected() {
        let config = ClassifierConfig::new()
            .with_idle_frames(true)
            .with_max_idle_gap(2);
        let mut replay = FrameReplay::new(&config);
        replay.push(&InputEvent::disengage(0, "x")).unwrap();

        let err = replay.push(&InputEvent::engage(u64::MAX - 1, "x")).unwrap_err();
        assert!(matches!(
            err,
            GestureError::IdleGapTooLarge { from: 0, limit: 2, .. }
        ));
        assert_eq!(replay.open_frame(), Some(0));
        assert_eq!(
            replay.classifier().state(&Channel::from("x")),
            GestureState::new(false, true, true)
        );

        let closed = replay.push(&InputEvent::engage(3, "x")).unwrap();
        let frames: Vec<u64> = closed.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 1, 2]);
    }

    #[test]
    fn test_idle_gap_ignored_without_idle_frames() {
        let config = ClassifierConfig::new().with_max_idle_gap(0);
        let events = vec![
            InputEvent::disengage(0, "x"),
            InputEvent::engage(u64::MAX - 1, "x"),
        ];
        let snapshots = replay_events(&events, &config).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].frame, u64::MAX - 1);
    }

    #[test]
    fn test_invalid_event_rejected() {
        let mut event = InputEvent::engage(0, "x");
        event.channel = None;
        let mut replay = FrameReplay::default();
        assert!(matches!(replay.push(&event), Err(GestureError::ParseError(_))));
    }

    #[test]
    fn test_finish_without_events() {
        let mut replay = FrameReplay::default();
        assert_eq!(replay.finish(), None);
    }

    #[test]
    fn test_preregistered_channels_in_snapshot() {
        let config = ClassifierConfig::new().with_channel("x").with_channel("a");
        let snapshots = replay_events(&[InputEvent::tick(0)], &config).unwrap();
        assert_eq!(snapshots[0].channels.len(), 2);
        assert!(snapshots[0].channels.values().all(|s| s.is_idle()));
    }
}
