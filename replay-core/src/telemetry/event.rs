//! `TelemetryEvent`: a single per-attempt row (spec §3).

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::strategy::StrategyKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub run_id: String,
    pub step_number: u32,
    pub strategy_kind: StrategyKind,
    pub attempt_index: usize,
    pub succeeded: bool,
    pub confidence: f64,
    pub duration_ms: u64,
    pub error_kind: Option<ErrorKind>,
}

impl TelemetryEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: impl Into<String>,
        step_number: u32,
        strategy_kind: StrategyKind,
        attempt_index: usize,
        succeeded: bool,
        confidence: f64,
        duration_ms: u64,
        error_kind: Option<ErrorKind>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_number,
            strategy_kind,
            attempt_index,
            succeeded,
            confidence,
            duration_ms,
            error_kind,
        }
    }
}
