//! Session statistics
//!
//! This module provides the shared statistics registry and the stream
//! decorator that feeds it. Byte accounting lives entirely here; the relay
//! engine itself only moves bytes.

mod registry;
mod tracker;

pub use registry::{RegistrySnapshot, SessionSnapshot, SessionStats, StatsRegistry};
pub use tracker::TrackedStream;
