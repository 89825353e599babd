//! Error types for replay-core.
//!
//! Evaluators and capture layers never propagate [`Error`] across their
//! boundary (see `evaluator` and `capture`): a missing element, a low-
//! confidence OCR hit, or a dead layer is represented as `found: false` plus
//! an [`ErrorKind`], not a thrown error. `Error` is reserved for port- and
//! session-level failures that the `DecisionEngine` cannot route around.

use thiserror::Error;

/// Result type alias using replay-core's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-level error kinds, fixed per the external interface contract.
///
/// These are attached to both [`Error`] values and per-attempt outcomes
/// (`EvalResult`, `TelemetryEvent`) so a replay failure can always be
/// triaged by kind regardless of which layer produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ElementNotFound,
    AllStrategiesFailed,
    ExecutionTimeout,
    StepValidationFailed,
    CdpNotAttached,
    CdpAttachFailed,
    CdpTimeout,
    VisionInitFailed,
    VisionOcrFailed,
    VisionConfidenceLow,
    TabNotFound,
    PermissionDenied,
    InvalidMessage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Errors that can occur at a port or session boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// A host RPC port returned `{ok: false}`.
    #[error("{kind}: {message}")]
    Port { kind: ErrorKind, message: String },

    /// The debugger/CDP session could not be attached or was lost.
    #[error("CDP session error on tab {tab_id}: {message}")]
    Cdp { tab_id: String, message: String },

    /// Telemetry or sequence-pattern storage error.
    #[error("telemetry storage error: {0}")]
    Telemetry(String),

    /// Schema migration failed or encountered an unrecognized payload shape.
    #[error("migration error: {0}")]
    Migration(String),

    /// A recording or action payload failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error that should not be reachable in correct usage.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn port(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Port {
            kind,
            message: message.into(),
        }
    }

    /// The wire-level kind for this error, for cases that need to report one
    /// even though `Error` itself doesn't always carry a structured kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Port { kind, .. } => *kind,
            Self::Cdp { .. } => ErrorKind::CdpNotAttached,
            Self::Telemetry(_) | Self::Internal(_) => ErrorKind::InvalidMessage,
            Self::Migration(_) | Self::Validation(_) => ErrorKind::StepValidationFailed,
            Self::Serialization(_) => ErrorKind::InvalidMessage,
        }
    }
}
