//! Recording pipeline: event intake, filtering, target resolution, and
//! fallback-chain-bearing `Action` emission (spec §4.1-§4.2).

pub mod emitter;
pub mod event;
pub mod event_filter;
pub mod session;
pub mod target_resolver;

pub use emitter::{action_kind_for, ActionEmitter};
pub use event::{EventContext, EventKind, NodeDescriptor, RawEvent, TargetHandle};
pub use event_filter::EventFilter;
pub use session::RecordingSession;
pub use target_resolver::TargetResolver;
