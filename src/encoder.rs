//! Frame encoding
//!
//! This module wraps frame snapshots into gesture.frame.v1 records carrying
//! producer metadata and the time the record was computed.

use crate::error::GestureError;
use crate::types::{FrameProducer, FrameRecord, FrameSnapshot};
use crate::{GESTURE_FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current output schema version
pub const FRAME_SCHEMA_VERSION: &str = "gesture.frame.v1";

/// Encoder for frame records
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a snapshot into a frame record
    pub fn encode(&self, snapshot: &FrameSnapshot) -> FrameRecord {
        FrameRecord {
            schema_version: FRAME_SCHEMA_VERSION.to_string(),
            producer: FrameProducer {
                name: PRODUCER_NAME.to_string(),
                version: GESTURE_FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            frame: snapshot.frame,
            computed_at_utc: Utc::now().to_rfc3339(),
            channels: snapshot.channels.clone(),
        }
    }

    /// Encode to a compact JSON string (one NDJSON line)
    pub fn encode_to_json(&self, snapshot: &FrameSnapshot) -> Result<String, GestureError> {
        let record = self.encode(snapshot);
        serde_json::to_string(&record).map_err(GestureError::JsonError)
    }
}
