//! `Run`: the state a replay accumulates across one `Recording`'s steps.

use crate::error::ErrorKind;
use crate::strategy::StrategyKind;

/// Whether a `Run` halts or continues after a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub stop_on_error: bool,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self { stop_on_error: true }
    }
}

/// The outcome of walking one `Action`'s fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A strategy resolved, passed actionability, and dispatched.
    Succeeded { strategy_kind: StrategyKind, attempt_index: usize },
    /// Every enabled strategy in the chain was attempted and none succeeded.
    AllStrategiesFailed,
    /// The step deadline elapsed before the chain was exhausted.
    TimedOut,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The `ErrorKind` a failed outcome maps to, for the aggregate `Error`
    /// a halted `Run` surfaces to its caller.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Succeeded { .. } => None,
            Self::AllStrategiesFailed => Some(ErrorKind::AllStrategiesFailed),
            Self::TimedOut => Some(ErrorKind::ExecutionTimeout),
        }
    }
}

/// One replay of a `Recording` against a live tab.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: String,
    pub recording_id: String,
    pub policy: RunPolicy,
    pub step_outcomes: Vec<StepOutcome>,
}

impl Run {
    pub fn new(id: impl Into<String>, recording_id: impl Into<String>, policy: RunPolicy) -> Self {
        Self {
            id: id.into(),
            recording_id: recording_id.into(),
            policy,
            step_outcomes: Vec::new(),
        }
    }

    /// Records a step's outcome and reports whether the run should continue
    /// to the next step.
    pub fn record_step(&mut self, outcome: StepOutcome) -> bool {
        let should_continue = outcome.is_success() || !self.policy.stop_on_error;
        self.step_outcomes.push(outcome);
        should_continue
    }

    pub fn succeeded_steps(&self) -> usize {
        self.step_outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_steps(&self) -> usize {
        self.step_outcomes.len() - self.succeeded_steps()
    }
}
