//! Evidence-based locator recorder/replayer core.
//!
//! Records a user's interactions with a web page — gathering parallel DOM,
//! visual, mouse, and network evidence for each action — and synthesizes a
//! ranked fallback chain of locator strategies. On replay, the chain is
//! walked in confidence order, gated by an auto-waiting actionability
//! check, with append-only telemetry for every attempt.
//!
//! The host extension shell (manifest, dashboard UI, project/recording
//! CRUD, import/export, CSV-driven substitution, persistence backend,
//! screenshot/OCR transport) is out of scope; this crate models those
//! collaborators as the ports in [`ports`] and [`repository`].

pub mod action;
pub mod actionability;
pub mod capture;
pub mod chain;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod migration;
pub mod ports;
pub mod record;
pub mod repository;
pub mod strategy;
pub mod telemetry;

pub use action::{Action, ActionKind, FallbackChain, Recording, StepNumber};
pub use actionability::{Actionability, ActionabilityOutcome, Predicate};
pub use config::{ActionabilityConfig, RecorderConfig, ReplayConfig, ScoringThresholds};
pub use decision::{DecisionEngine, Run, RunPolicy, StepOutcome};
pub use error::{Error, ErrorKind, Result};
pub use strategy::{Strategy, StrategyKind, StrategyMetadata};
pub use telemetry::TelemetryEvent;
