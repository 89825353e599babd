//! Append-only per-attempt telemetry (spec §3, §4.5, §7).

pub mod event;
pub mod store;

pub use event::TelemetryEvent;
pub use store::{SqliteTelemetryStore, TelemetryStore};
