//! Four parallel evidence collectors (spec §4.1).
//!
//! Each layer is independently optional: a capture exception degrades that
//! layer's evidence field to `None`, never the `Action` (spec §4.1 failure
//! semantics, §7).

pub mod dom;
pub mod mouse;
pub mod network;
pub mod vision;

pub use dom::DomCapture;
pub use mouse::{MouseCapture, MouseSnapshot, TrajectoryPattern};
pub use network::{NetworkCapture, NetworkSample, NetworkSnapshot};
pub use vision::{VisionCapture, VisionSnapshot};

use crate::record::event::EventContext;

/// The contract every capture layer implements.
///
/// `snapshot` is synchronous by design (spec §4.1: "a synchronous
/// `snapshot(eventContext)`") — any I/O a layer needs (e.g. vision's
/// screenshot/OCR round trip) happens asynchronously ahead of time or is
/// modeled as a best-effort cache read, keeping the event-accept path on
/// the single cooperative loop non-blocking.
pub trait CaptureLayer: Send + Sync {
    type Snapshot;

    fn start(&mut self);
    fn stop(&mut self);
    fn snapshot(&self, ctx: &EventContext) -> Option<Self::Snapshot>;
}

/// Aggregated evidence attached to an `Action`, one optional field per
/// layer. `dom` is a lightweight change-detection snapshot distinct from
/// the action's primary `LocatorBundle` (spec §3: the bundle and the
/// evidence are separate fields).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Evidence {
    pub dom: Option<dom::DomEvidence>,
    pub vision: Option<VisionSnapshot>,
    pub mouse: Option<MouseSnapshot>,
    pub network: Option<NetworkSnapshot>,
}
