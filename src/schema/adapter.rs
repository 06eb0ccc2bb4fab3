//! Parsing helpers for gesture.input_event.v1 streams

use crate::error::GestureError;
use crate::schema::input_event::*;
use crate::types::Channel;
use std::collections::BTreeSet;

/// Adapter for reading input records
pub struct InputEventAdapter;

impl InputEventAdapter {
    /// Parse a JSON string containing an array of InputEvents
    pub fn parse_array(json: &str) -> Result<Vec<InputEvent>, GestureError> {
        let events: Vec<InputEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing InputEvents
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<InputEvent>, GestureError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            if let Some(event) = Self::parse_line(line).map_err(|e| {
                GestureError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Parse one NDJSON line; blank lines yield `None`
    pub fn parse_line(line: &str) -> Result<Option<InputEvent>, serde_json::Error> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(trimmed).map(Some)
    }

    /// Validate a batch of events, returning only the failures
    pub fn validate_events(events: &[InputEvent]) -> Vec<ValidationResult> {
        events
            .iter()
            .enumerate()
            .filter_map(|(idx, event)| {
                event.validate().err().map(|error| ValidationResult {
                    index: idx,
                    event_id: event.event_id.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Find records a frame replay would refuse for their frame number: a
    /// frame lower than the one still open, or one that has already been
    /// closed by a later frame or by a tick record.
    pub fn frame_order_issues(events: &[InputEvent]) -> Vec<FrameOrderIssue> {
        let mut issues = Vec::new();
        let mut open: Option<u64> = None;
        let mut closed: Option<u64> = None;

        for (index, event) in events.iter().enumerate() {
            let frame = event.frame;
            let refused_by = match (closed, open) {
                (Some(last), _) if frame <= last => Some(last),
                (_, Some(current)) if frame < current => Some(current),
                _ => None,
            };
            if let Some(previous) = refused_by {
                let kind = if Some(frame) == closed {
                    FrameOrderKind::Reopened
                } else {
                    FrameOrderKind::Backwards
                };
                issues.push(FrameOrderIssue {
                    index,
                    frame,
                    previous,
                    kind,
                });
                continue;
            }

            if let Some(current) = open {
                if frame > current {
                    closed = Some(current);
                }
            }
            open = Some(frame);
            if event.kind == EventKind::Tick {
                closed = Some(frame);
                open = None;
            }
        }
        issues
    }

    /// Distinct channels named by the records, in name order
    pub fn channels(events: &[InputEvent]) -> BTreeSet<Channel> {
        events
            .iter()
            .filter_map(|event| event.channel.clone())
            .filter(|channel| !channel.is_empty())
            .collect()
    }
}

/// How a record breaks frame ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrderKind {
    /// Lower than a frame already seen
    Backwards,
    /// Same frame as one already closed
    Reopened,
}

impl FrameOrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameOrderKind::Backwards => "backwards",
            FrameOrderKind::Reopened => "reopened",
        }
    }
}

/// A record out of frame order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOrderIssue {
    pub index: usize,
    pub frame: u64,
    /// Open or last closed frame the record was compared against
    pub previous: u64,
    pub kind: FrameOrderKind,
}

/// A failed validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub event_id: Option<String>,
    pub error: ValidationError,
}
