//! Gesture Flux - Tap / Press / Hold classification for binary input channels
//!
//! Gesture Flux turns the interaction events reported by a host input library
//! into three derived states per channel: a one-frame Tap when the input is
//! engaged, a one-frame Press when it is released, and a latched Hold armed
//! by the release and cleared by the host's long-hold interaction.
//!
//! ## Modules
//!
//! - **Classifier**: the per-channel state machine (`GestureClassifier`)
//! - **Replay**: frame-by-frame replay of recorded input events into snapshots

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod replay;
pub mod schema;
pub mod types;

pub use classifier::GestureClassifier;
pub use config::{ClassifierConfig, UnknownChannelPolicy, DEFAULT_MAX_IDLE_GAP};
pub use error::GestureError;
pub use observer::{GestureObserver, LogObserver, RecordingObserver};
pub use pipeline::{events_to_frames, GestureProcessor};
pub use replay::{replay_events, FrameReplay};
pub use types::{Channel, Gesture, GestureEvent, GestureState, Interaction, InteractionPhase};

// Schema exports
pub use schema::{InputEvent, InputEventAdapter, SCHEMA_VERSION};

/// Version embedded in all frame records
pub const GESTURE_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for frame records
pub const PRODUCER_NAME: &str = "gesture-flux";
