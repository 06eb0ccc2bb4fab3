use gesture_flux::{
    events_to_frames, replay_events, Channel, ClassifierConfig, GestureClassifier, GestureEvent,
    GestureProcessor, GestureState, InputEvent, InputEventAdapter, Interaction, InteractionPhase,
    RecordingObserver,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const IDLE: GestureState = GestureState::new(false, false, false);
const HELD: GestureState = GestureState::new(false, false, true);

fn x() -> Channel {
    Channel::from("x")
}

fn a() -> Channel {
    Channel::from("a")
}

#[test]
fn engage_then_tick_decays_tap() {
    let mut classifier = GestureClassifier::new();
    classifier.on_engage_detected(x());
    classifier.tick();
    assert_eq!(classifier.state(&x()), IDLE);
}

#[test]
fn release_latches_hold_across_ticks() {
    let mut classifier = GestureClassifier::new();
    classifier.on_engage_detected(x());
    classifier.on_disengage_detected(x());
    classifier.tick();
    assert_eq!(classifier.state(&x()), HELD);
}

#[test]
fn hold_release_clears_latch() {
    let mut classifier = GestureClassifier::new();
    classifier.on_engage_detected(x());
    classifier.on_disengage_detected(x());
    classifier.on_hold_release_detected(x());
    classifier.tick();
    assert_eq!(classifier.state(&x()), IDLE);
}

#[test]
fn interleaved_channels_stay_independent() {
    let mut interleaved = GestureClassifier::new();
    interleaved.on_engage_detected(x());
    interleaved.on_engage_detected(a());
    interleaved.on_disengage_detected(a());
    interleaved.tick();
    interleaved.on_disengage_detected(x());
    interleaved.on_hold_release_detected(a());

    let mut only_x = GestureClassifier::new();
    only_x.on_engage_detected(x());
    only_x.tick();
    only_x.on_disengage_detected(x());

    let mut only_a = GestureClassifier::new();
    only_a.on_engage_detected(a());
    only_a.on_disengage_detected(a());
    only_a.tick();
    only_a.on_hold_release_detected(a());

    assert_eq!(interleaved.state(&x()), only_x.state(&x()));
    assert_eq!(interleaved.state(&a()), only_a.state(&a()));
    assert_eq!(interleaved.state(&x()), GestureState::new(false, true, true));
    assert_eq!(interleaved.state(&a()), IDLE);
}

#[test]
fn host_interaction_sequence_for_long_press() {
    // Tap interaction starts and performs on press, cancels on release; the
    // hold interaction performs on the same release once past its threshold.
    let mut classifier = GestureClassifier::new();
    let phases = [
        (Interaction::Tap, InteractionPhase::Started),
        (Interaction::Hold, InteractionPhase::Started),
        (Interaction::Tap, InteractionPhase::Performed),
    ];
    for (interaction, phase) in phases {
        classifier.on_interaction(x(), interaction, phase);
    }
    assert_eq!(classifier.state(&x()), GestureState::new(true, false, false));
    classifier.tick();

    classifier.on_interaction(x(), Interaction::Tap, InteractionPhase::Canceled);
    assert_eq!(classifier.state(&x()), GestureState::new(false, true, true));
    classifier.tick();
    assert_eq!(classifier.state(&x()), HELD);

    classifier.on_interaction(x(), Interaction::Hold, InteractionPhase::Performed);
    classifier.tick();
    assert_eq!(classifier.state(&x()), IDLE);
}

#[test]
fn replay_matches_direct_calls() {
    let ndjson = r#"
{"schema_version":"gesture.input_event.v1","frame":0,"channel":"x","kind":"engage"}
{"schema_version":"gesture.input_event.v1","frame":0,"channel":"a","kind":"engage"}
{"schema_version":"gesture.input_event.v1","frame":1,"channel":"a","kind":"disengage"}
{"schema_version":"gesture.input_event.v1","frame":1,"channel":"x","kind":"disengage"}
{"schema_version":"gesture.input_event.v1","frame":2,"channel":"x","kind":"hold_release"}
"#;
    let events = InputEventAdapter::parse_ndjson(ndjson).unwrap();
    let snapshots = replay_events(&events, &ClassifierConfig::default()).unwrap();

    let mut classifier = GestureClassifier::new();
    classifier.on_engage_detected(x());
    classifier.on_engage_detected(a());
    assert_eq!(snapshots[0].channels, classifier.snapshot());
    classifier.tick();

    classifier.on_disengage_detected(a());
    classifier.on_disengage_detected(x());
    assert_eq!(snapshots[1].channels, classifier.snapshot());
    classifier.tick();

    classifier.on_hold_release_detected(x());
    assert_eq!(snapshots[2].channels, classifier.snapshot());

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[2].channels[&a()], HELD);
}

#[test]
fn idle_frames_show_hold_latched() {
    let config = ClassifierConfig::new()
        .with_channel("x")
        .with_channel("a")
        .with_idle_frames(true);
    let events = vec![
        InputEvent::disengage(10, "x"),
        InputEvent::hold_release(13, "x"),
    ];
    let snapshots = replay_events(&events, &config).unwrap();

    let holds: Vec<(u64, bool)> = snapshots
        .iter()
        .map(|s| (s.frame, s.channels[&x()].hold))
        .collect();
    assert_eq!(holds, vec![(10, true), (11, true), (12, true), (13, false)]);
    assert!(snapshots.iter().all(|s| s.channels[&a()] == IDLE));
}

#[test]
fn ndjson_round_trip_through_frames() {
    let events = vec![
        InputEvent::engage(0, "x"),
        InputEvent::tick(0),
        InputEvent::disengage(1, "x"),
    ];
    let ndjson: String = events
        .iter()
        .map(|e| serde_json::to_string(e).unwrap() + "\n")
        .collect();

    let frames = events_to_frames(ndjson, &ClassifierConfig::default()).unwrap();
    assert_eq!(frames.len(), 2);

    let last: serde_json::Value = serde_json::from_str(&frames[1]).unwrap();
    assert_eq!(last["frame"], 1);
    assert_eq!(last["channels"]["x"]["press"], true);
    assert_eq!(last["channels"]["x"]["hold"], true);
}

#[test]
fn host_reads_recorded_transitions_during_replay() {
    let recorder = Rc::new(RefCell::new(RecordingObserver::default()));
    let mut processor = GestureProcessor::new();
    processor.observe(Rc::clone(&recorder));

    processor
        .process_events(&[
            InputEvent::engage(0, "x"),
            InputEvent::disengage(1, "x"),
            InputEvent::hold_release(2, "x"),
        ])
        .unwrap();
    processor.finish();

    let recorded = recorder.borrow();
    let events: Vec<GestureEvent> = recorded.transitions.iter().map(|t| t.1).collect();
    assert_eq!(
        events,
        vec![GestureEvent::Engage, GestureEvent::Disengage, GestureEvent::HoldRelease]
    );
    assert_eq!(recorded.transitions[1].2, GestureState::new(false, true, true));
    assert_eq!(recorded.ticks, 3);
}
