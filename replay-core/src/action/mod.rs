//! The `Action` data model and its owning `Recording` (spec §3).

pub mod bundle;

pub use bundle::{ContextHints, FrameLocator, LocatorBundle};

use serde::{Deserialize, Serialize};

use crate::capture::Evidence;
use crate::error::{Error, Result};
use crate::strategy::Strategy;

/// Monotone, contiguous step counter within a recording (`1..N`, no gaps —
/// spec §3, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepNumber(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Open,
    Click,
    Input,
    Enter,
    Keypress,
}

/// Ordered, non-empty, confidence-sorted list of strategies for one action
/// (spec §3 invariants, §8 universal invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackChain(Vec<Strategy>);

impl FallbackChain {
    /// Validates and wraps a chain: non-empty, sorted strictly
    /// non-increasing by confidence, no duplicate `(kind, metadata)` pairs.
    pub fn new(strategies: Vec<Strategy>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(Error::Validation("fallback chain must be non-empty".into()));
        }

        for pair in strategies.windows(2) {
            if pair[0].confidence < pair[1].confidence {
                return Err(Error::Validation(
                    "fallback chain must be sorted non-increasing by confidence".into(),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for s in &strategies {
            if !seen.insert(s.identity_key()) {
                return Err(Error::Validation(
                    "fallback chain contains a duplicate (kind, metadata) strategy".into(),
                ));
            }
        }

        Ok(Self(strategies))
    }

    pub fn primary(&self) -> &Strategy {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[Strategy] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Strategy> {
        self.0.iter()
    }
}

/// One recorded user interaction with its full evidence and fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub step_number: StepNumber,
    pub timestamp_ms: u64,
    pub kind: ActionKind,
    /// Final value for `input`; key name for key events; absent otherwise.
    pub value: Option<String>,
    pub locator_bundle: Option<LocatorBundle>,
    pub evidence: Evidence,
    pub fallback_chain: Option<FallbackChain>,
}

impl Action {
    /// Every non-`open` action must carry a non-empty fallback chain.
    pub fn validate(&self) -> Result<()> {
        if self.kind != ActionKind::Open && self.fallback_chain.is_none() {
            return Err(Error::Validation(format!(
                "step {} ({:?}) is missing a fallback chain",
                self.step_number.0, self.kind
            )));
        }
        Ok(())
    }
}

/// A Recording exclusively owns its Actions (spec §3 ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub schema_version: u32,
    pub actions: Vec<Action>,
}

impl Recording {
    pub fn new(id: impl Into<String>, name: impl Into<String>, project_id: impl Into<String>, schema_version: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_id: project_id.into(),
            schema_version,
            actions: Vec::new(),
        }
    }

    /// Appends an action, enforcing the unique-and-contiguous `stepNumber`
    /// invariant (spec §3, §8).
    pub fn push_action(&mut self, action: Action) -> Result<()> {
        action.validate()?;
        let expected = self.actions.len() as u32 + 1;
        if action.step_number.0 != expected {
            return Err(Error::Validation(format!(
                "expected step_number {expected}, got {}",
                action.step_number.0
            )));
        }
        self.actions.push(action);
        Ok(())
    }
}
