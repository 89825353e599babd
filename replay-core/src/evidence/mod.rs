//! Evidence subsystem shared between recording and replay: mouse trail
//! scoring and learned sequence patterns (spec §4.8).

pub mod mouse_trail;
pub mod sequence_pattern;

pub use mouse_trail::{MouseTrail, MouseTrailPoint, MouseTrailTracker};
pub use sequence_pattern::{PatternStoreBlob, SequencePattern, SequencePatternAnalyzer};
