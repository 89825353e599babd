//! Ambient configuration.
//!
//! Thresholds here are fixed by spec (OCR floor 60, scoring buckets
//! 0.85/0.60/0.30); the structs exist so tests and embedders can override
//! them explicitly rather than so end users tune them, per the Open
//! Questions note in the spec about these being hard-coded in the source.

use std::time::Duration;

/// Configuration for the recording pipeline.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Duplicate-event suppression window (key = kind + tag + id + rounded coords).
    pub debounce_ms: u64,
    /// Side length, in px, of the square OCR capture region centered on the click point.
    pub ocr_region_size: u32,
    /// Mouse trail sampling rate ceiling.
    pub mouse_sample_hz: u32,
    /// Mouse trail point time-to-live.
    pub mouse_trail_ttl: Duration,
    /// Maximum CSS-path depth the DOM capture will walk for a minimal selector.
    pub max_selector_depth: u32,
    /// Bounded ring size for recent network request samples.
    pub network_ring_size: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            ocr_region_size: 200,
            mouse_sample_hz: 20,
            mouse_trail_ttl: Duration::from_secs(5),
            max_selector_depth: 6,
            network_ring_size: 50,
        }
    }
}

impl RecorderConfig {
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_ocr_region_size(mut self, px: u32) -> Self {
        self.ocr_region_size = px;
        self
    }
}

/// Confidence scoring thresholds used by the evidence-scoring evaluator.
#[derive(Debug, Clone, Copy)]
pub struct ScoringThresholds {
    /// Scores at or above this are auto-applied.
    pub auto_apply: f64,
    /// Scores at or above this (and below `auto_apply`) are applied with a flag.
    pub apply_with_flag: f64,
    /// Scores below this are rejected outright.
    pub reject_below: f64,
    /// OCR confidence (0-100 scale) below which a vision candidate is skipped entirely.
    pub ocr_confidence_floor: u8,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            auto_apply: 0.85,
            apply_with_flag: 0.60,
            reject_below: 0.30,
            ocr_confidence_floor: 60,
        }
    }
}

/// Per-evaluator timeout budgets.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorTimeouts {
    pub dom_selector: Duration,
    pub cdp_semantic: Duration,
    pub cdp_power: Duration,
    pub evidence_scoring: Duration,
    pub vision_ocr: Duration,
    pub coordinates: Duration,
}

impl Default for EvaluatorTimeouts {
    fn default() -> Self {
        Self {
            dom_selector: Duration::from_millis(500),
            cdp_semantic: Duration::from_millis(800),
            cdp_power: Duration::from_millis(500),
            // Evidence scoring has a hard wall-clock ceiling regardless of the step deadline.
            evidence_scoring: Duration::from_secs(5),
            vision_ocr: Duration::from_secs(3),
            coordinates: Duration::from_millis(200),
        }
    }
}

/// Configuration for the actionability polling gate.
#[derive(Debug, Clone, Copy)]
pub struct ActionabilityConfig {
    pub poll_interval: Duration,
    pub default_timeout: Duration,
    /// Gap between the two stability samples used to decide the bounding box is unchanged.
    pub stability_sample_gap: Duration,
}

impl Default for ActionabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            default_timeout: Duration::from_secs(5),
            stability_sample_gap: Duration::from_millis(100),
        }
    }
}

/// Configuration for a replay `Run`.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Per-step deadline for the whole chain walk.
    pub step_deadline: Duration,
    pub actionability: ActionabilityConfig,
    pub evaluator_timeouts: EvaluatorTimeouts,
    pub scoring: ScoringThresholds,
    /// Strategy kinds disabled for this run; skipped without an attempt record.
    pub disabled_kinds: Vec<crate::strategy::StrategyKind>,
    /// Whether the run halts at the first step-level failure.
    pub stop_on_error: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            step_deadline: Duration::from_secs(30),
            actionability: ActionabilityConfig::default(),
            evaluator_timeouts: EvaluatorTimeouts::default(),
            scoring: ScoringThresholds::default(),
            disabled_kinds: Vec::new(),
            stop_on_error: true,
        }
    }
}

impl ReplayConfig {
    pub fn with_step_deadline(mut self, d: Duration) -> Self {
        self.step_deadline = d;
        self
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn disable_kind(mut self, kind: crate::strategy::StrategyKind) -> Self {
        self.disabled_kinds.push(kind);
        self
    }
}

/// Initialize process-wide `tracing` output. Safe to call more than once;
/// subsequent calls are no-ops if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
