//! Pipeline orchestration
//!
//! This module provides the record-level API for Gesture Flux: input records
//! go through the frame replay and come out as encoded frame records.

use crate::classifier::GestureClassifier;
use crate::config::ClassifierConfig;
use crate::encoder::SnapshotEncoder;
use crate::error::GestureError;
use crate::observer::GestureObserver;
use crate::replay::FrameReplay;
use crate::schema::{InputEvent, InputEventAdapter};
use crate::types::FrameRecord;

/// Convert an NDJSON stream of input records into NDJSON frame records.
///
/// # Arguments
/// * `ndjson` - gesture.input_event.v1 records, one per line
/// * `config` - Classifier configuration
///
/// # Returns
/// One JSON string per closed frame, in frame order
///
/// # Example
/// ```ignore
/// let frames = events_to_frames(ndjson, &ClassifierConfig::default())?;
/// ```
pub fn events_to_frames(
    ndjson: String,
    config: &ClassifierConfig,
) -> Result<Vec<String>, GestureError> {
    let mut processor = GestureProcessor::with_config(config);
    let mut frames = processor.process_ndjson(&ndjson)?;
    if let Some(last) = processor.finish() {
        frames.push(serde_json::to_string(&last)?);
    }
    Ok(frames)
}

/// Stateful processor for incremental (streaming) replay.
///
/// Classifier state is kept between calls; call `finish` at end of input
/// to close the last open frame.
pub struct GestureProcessor {
    replay: FrameReplay,
    encoder: SnapshotEncoder,
}

impl Default for GestureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::with_config(&ClassifierConfig::default())
    }

    /// Create a processor from a configuration
    pub fn with_config(config: &ClassifierConfig) -> Self {
        Self {
            replay: FrameReplay::new(config),
            encoder: SnapshotEncoder::new(),
        }
    }

    /// Create a processor from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, GestureError> {
        let config = ClassifierConfig::from_json(json)?;
        Ok(Self::with_config(&config))
    }

    /// Use a fixed producer instance ID
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.encoder = SnapshotEncoder::with_instance_id(instance_id);
        self
    }

    pub fn classifier(&self) -> &GestureClassifier {
        self.replay.classifier()
    }

    /// Install a transition observer on the underlying classifier
    pub fn observe(&mut self, observer: impl GestureObserver + 'static) {
        self.replay.classifier_mut().set_observer(observer);
    }

    /// Process parsed records, returning the frames they closed
    pub fn process_events(
        &mut self,
        events: &[InputEvent],
    ) -> Result<Vec<FrameRecord>, GestureError> {
        let snapshots = self.replay.push_all(events)?;
        Ok(snapshots.iter().map(|s| self.encoder.encode(s)).collect())
    }

    /// Process one NDJSON line; blank lines close nothing
    pub fn process_line(&mut self, line: &str) -> Result<Vec<FrameRecord>, GestureError> {
        let event = InputEventAdapter::parse_line(line)
            .map_err(|e| GestureError::ParseError(format!("Failed to parse event: {}", e)))?;
        match event {
            Some(event) => self.process_events(std::slice::from_ref(&event)),
            None => Ok(Vec::new()),
        }
    }

    /// Process an NDJSON document, returning closed frames as JSON strings
    pub fn process_ndjson(&mut self, ndjson: &str) -> Result<Vec<String>, GestureError> {
        let events = InputEventAdapter::parse_ndjson(ndjson)?;
        let records = self.process_events(&events)?;
        records
            .iter()
            .map(|r| serde_json::to_string(r).map_err(GestureError::JsonError))
            .collect()
    }

    /// Close the open frame at end of input
    pub fn finish(&mut self) -> Option<FrameRecord> {
        self.replay.finish().map(|s| self.encoder.encode(&s))
    }
}
