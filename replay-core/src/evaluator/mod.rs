//! Strategy evaluators: the replay-time counterpart to the chain-building
//! evaluators run at capture time (spec §4.3 — "StrategyEvaluators"), modeled
//! on the teacher's `ValidationStrategy`/`EpistemicVerifier` trait shape —
//! focused, independently pluggable, `Send + Sync`.

pub mod cdp_power;
pub mod cdp_semantic;
pub mod coordinates;
pub mod dom_selector;
pub mod evidence_scoring;
pub mod vision_ocr;

pub use cdp_power::CdpPowerEvaluator;
pub use cdp_semantic::CdpSemanticEvaluator;
pub use coordinates::CoordinatesEvaluator;
pub use dom_selector::DomSelectorEvaluator;
pub use evidence_scoring::EvidenceScoringEvaluator;
pub use vision_ocr::VisionOcrEvaluator;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::ErrorKind;
use crate::evidence::mouse_trail::MouseTrailPoint;
use crate::evidence::sequence_pattern::SequencePatternAnalyzer;
use crate::ports::{CdpPort, VisionPort};
use crate::strategy::{Rect, ScrollPosition, Strategy, StrategyKind};

/// A target resolved against the live page, ready for `ActionDispatcher`.
///
/// `node_id` is absent for `vision_ocr` and viewport-relative `coordinates`
/// hits, which have no corresponding DOM handle — the dispatcher falls back
/// to synthesizing input at `bounding_rect`'s center in that case (spec §4.3
/// "click point = matched box center").
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget {
    pub node_id: Option<u64>,
    pub bounding_rect: Rect,
}

/// The outcome of a single evaluator attempt. Evaluators never propagate
/// `Error` across this boundary (spec §4.3, §7 propagation policy) — a
/// missing element, a timed-out port call, or a sub-floor OCR confidence is
/// always represented as `found: false` plus an `ErrorKind`.
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub found: bool,
    pub confidence: f64,
    pub resolved: Option<ResolvedTarget>,
    pub error_kind: Option<ErrorKind>,
}

impl EvalResult {
    pub fn found(confidence: f64, resolved: ResolvedTarget) -> Self {
        Self {
            found: true,
            confidence,
            resolved: Some(resolved),
            error_kind: None,
        }
    }

    pub fn not_found(error_kind: ErrorKind) -> Self {
        Self {
            found: false,
            confidence: 0.0,
            resolved: None,
            error_kind: Some(error_kind),
        }
    }
}

/// Everything an evaluator's `evaluate` needs from the live replay session.
/// Not every field is relevant to every evaluator kind; unused ports are
/// simply ignored by the evaluators that don't need them.
///
/// `Copy` because every field is itself a reference or a small value type —
/// `DecisionEngine` rebuilds one per attempt with a fresh `deadline`.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub tab_id: &'a str,
    /// Cooperative per-strategy deadline; evaluators check this between
    /// internal steps (e.g. between OCR candidates) rather than relying
    /// solely on the caller's `tokio::time::timeout`.
    pub deadline: Instant,
    pub cdp: &'a dyn CdpPort,
    pub vision: &'a dyn VisionPort,
    pub current_scroll: ScrollPosition,
    pub current_mouse_trail: &'a [MouseTrailPoint],
    pub sequence_analyzer: &'a SequencePatternAnalyzer,
    pub prior_labels: &'a [String],
    pub page_url: &'a str,
    /// Per-tab success history: `(kind, identity_key)` -> recent success rate
    /// in `[0, 1]`, feeding the evidence-scoring evaluator's history axis.
    pub history: &'a dyn HistoryCache,
}

impl<'a> EvaluationContext<'a> {
    pub fn past_deadline(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Returns a copy of this context with a different per-attempt deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self { deadline, ..*self }
    }
}

/// The tab/session success cache the evidence-scoring evaluator's history
/// axis reads from (spec §4.3 "history 0.15 from the tab/session success
/// cache"). Kept abstract since the cache's retention policy is a host
/// concern, not part of this crate's scope.
pub trait HistoryCache: Send + Sync {
    fn success_rate(&self, identity_key: &str) -> Option<f64>;
}

/// An always-empty history cache, for callers with no prior replay history.
pub struct NoHistory;

impl HistoryCache for NoHistory {
    fn success_rate(&self, _identity_key: &str) -> Option<f64> {
        None
    }
}

/// Shared contract for every strategy evaluator (spec §4.3).
#[async_trait]
pub trait StrategyEvaluator: Send + Sync {
    /// The strategy kinds this evaluator resolves.
    fn handled_kinds(&self) -> &'static [StrategyKind];

    /// Resolves one fallback-chain entry of a handled kind against the live
    /// page. Never throws across this boundary (spec §7).
    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult;
}
