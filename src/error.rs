//! Error types for Gesture Flux

use thiserror::Error;

/// Errors that can occur outside the infallible classifier transitions
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("Failed to parse input events: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Frame {got} arrived after frame {previous}")]
    OutOfOrderFrame { previous: u64, got: u64 },

    #[error("{gap} idle frames between frame {from} and frame {to} exceed the limit of {limit}")]
    IdleGapTooLarge { from: u64, to: u64, gap: u64, limit: u64 },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
