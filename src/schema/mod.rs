//! gesture.input_event.v1 schema
//!
//! This module defines the serialized form of classifier input: one record per
//! host interaction event or explicit frame tick, tagged with its frame number.

mod adapter;
mod input_event;

pub use adapter::*;
pub use input_event::*;
