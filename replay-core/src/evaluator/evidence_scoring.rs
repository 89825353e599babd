//! Five-axis weighted evidence re-scoring (spec §4.3 `evidence_scoring`,
//! §4.8). A candidate pool is read fresh from the live page and each
//! candidate is scored against the recorded identity on five independent
//! axes; the top candidate clearing `reject_below` is returned.

use async_trait::async_trait;

use crate::config::ScoringThresholds;
use crate::evidence::mouse_trail::{MouseTrailPoint, MouseTrailTracker};
use crate::error::ErrorKind;
use crate::ports::EvidenceCandidateNode;
use crate::strategy::{Strategy, StrategyKind, StrategyMetadata};

use super::{EvalResult, EvaluationContext, ResolvedTarget, StrategyEvaluator};

const WEIGHT_SPATIAL: f64 = 0.25;
const WEIGHT_SEQUENCE: f64 = 0.20;
const WEIGHT_VISUAL: f64 = 0.15;
const WEIGHT_DOM: f64 = 0.25;
const WEIGHT_HISTORY: f64 = 0.15;

pub struct EvidenceScoringEvaluator {
    pub thresholds: ScoringThresholds,
}

impl Default for EvidenceScoringEvaluator {
    fn default() -> Self {
        Self {
            thresholds: ScoringThresholds::default(),
        }
    }
}

const HANDLED: &[StrategyKind] = &[StrategyKind::EvidenceScoring];

/// dom 0.25 — id / name / aria-label / data-attribute agreement (spec §4.3).
/// Tag and input-type agreement live in [`visual_axis`] instead.
fn dom_axis(candidate: &EvidenceCandidateNode, recorded: &StrategyMetadata) -> f64 {
    let StrategyMetadata::EvidenceScoring {
        recorded_id,
        recorded_name,
        recorded_aria_label,
        recorded_data_attrs,
        ..
    } = recorded
    else {
        return 0.0;
    };

    let mut hits = 0.0_f64;
    let mut total = 0.0_f64;

    if recorded_id.is_some() {
        total += 1.0;
        if candidate.id == *recorded_id {
            hits += 1.0;
        }
    }
    if recorded_name.is_some() {
        total += 1.0;
        if candidate.name == *recorded_name {
            hits += 1.0;
        }
    }
    if recorded_aria_label.is_some() {
        total += 1.0;
        if candidate.aria_label == *recorded_aria_label {
            hits += 1.0;
        }
    }
    if !recorded_data_attrs.is_empty() {
        total += 1.0;
        let matching = recorded_data_attrs
            .iter()
            .filter(|(k, v)| candidate.data_attributes.get(k) == Some(v))
            .count();
        hits += matching as f64 / recorded_data_attrs.len() as f64;
    }

    // No id/name/aria-label/data-attrs were recorded at all: neither confirms
    // nor contradicts this candidate.
    if total == 0.0 {
        return 0.5;
    }

    (hits / total).clamp(0.0, 1.0)
}

/// visual 0.15 — tag and input-type agreement with the recorded bundle
/// (spec §4.3).
fn visual_axis(candidate: &EvidenceCandidateNode, recorded: &StrategyMetadata) -> f64 {
    let StrategyMetadata::EvidenceScoring {
        recorded_tag,
        recorded_input_type,
        ..
    } = recorded
    else {
        return 0.0;
    };

    let mut hits = 0.0_f64;
    let mut total = 1.0_f64;
    if candidate.tag_name.eq_ignore_ascii_case(recorded_tag) {
        hits += 1.0;
    }

    if let Some(expected) = recorded_input_type {
        total += 1.0;
        if candidate.input_type.as_deref().is_some_and(|actual| actual.eq_ignore_ascii_case(expected)) {
            hits += 1.0;
        }
    }

    (hits / total).clamp(0.0, 1.0)
}

fn size_similarity(a: crate::strategy::Rect, b: crate::strategy::Rect) -> f64 {
    fn ratio(a: f64, b: f64) -> f64 {
        let larger = a.max(b).max(1.0);
        1.0 - (a - b).abs() / larger
    }
    ((ratio(a.width, b.width) + ratio(a.height, b.height)) / 2.0).clamp(0.0, 1.0)
}

/// spatial 0.25 — scroll-compensated position proximity, size similarity,
/// and mouse-trajectory approach score, averaged (spec §4.3).
fn spatial_axis(
    candidate: &EvidenceCandidateNode,
    recorded: &StrategyMetadata,
    current_scroll: crate::strategy::ScrollPosition,
    trail: &[MouseTrailPoint],
) -> f64 {
    let StrategyMetadata::EvidenceScoring { recorded_bounds, recorded_scroll, .. } = recorded else {
        return 0.0;
    };

    let dx = current_scroll.x - recorded_scroll.x;
    let dy = current_scroll.y - recorded_scroll.y;
    let expected_center = (recorded_bounds.x - dx + recorded_bounds.width / 2.0, recorded_bounds.y - dy + recorded_bounds.height / 2.0);
    let actual_center = candidate.bounding_rect.center();

    let dist = ((expected_center.0 - actual_center.0).powi(2) + (expected_center.1 - actual_center.1).powi(2)).sqrt();
    let diag = (recorded_bounds.width.powi(2) + recorded_bounds.height.powi(2)).sqrt().max(1.0);
    let proximity = (1.0 - (dist / (diag * 2.0)).min(1.0)).max(0.0);

    let size = size_similarity(*recorded_bounds, candidate.bounding_rect);

    let trajectory = if trail.len() >= 2 {
        MouseTrailTracker::analyze_with_scroll(*recorded_bounds, trail, *recorded_scroll, current_scroll)
    } else {
        0.0
    };

    ((proximity + size + trajectory) / 3.0).clamp(0.0, 1.0)
}

#[async_trait]
impl StrategyEvaluator for EvidenceScoringEvaluator {
    fn handled_kinds(&self) -> &'static [StrategyKind] {
        HANDLED
    }

    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult {
        let StrategyMetadata::EvidenceScoring { recorded_tag, .. } = &strategy.metadata else {
            return EvalResult::not_found(ErrorKind::InvalidMessage);
        };

        let candidates = match ctx.cdp.query_candidates_by_tag(ctx.tab_id, recorded_tag).await {
            Ok(c) => c,
            Err(_) => return EvalResult::not_found(ErrorKind::ElementNotFound),
        };
        if candidates.is_empty() {
            return EvalResult::not_found(ErrorKind::ElementNotFound);
        }

        let current_scroll = ctx.current_scroll;

        let mut best: Option<(f64, &EvidenceCandidateNode)> = None;
        for candidate in &candidates {
            let spatial = spatial_axis(candidate, &strategy.metadata, current_scroll, ctx.current_mouse_trail);
            let sequence = ctx.sequence_analyzer.score_candidate(ctx.page_url, ctx.prior_labels, &candidate.tag_name);
            let visual = visual_axis(candidate, &strategy.metadata);
            let dom = dom_axis(candidate, &strategy.metadata);
            let history = ctx.history.success_rate(&format!("{:?}:{}", StrategyKind::EvidenceScoring, candidate.node_id)).unwrap_or(0.5);

            let score = spatial * WEIGHT_SPATIAL
                + sequence * WEIGHT_SEQUENCE
                + visual * WEIGHT_VISUAL
                + dom * WEIGHT_DOM
                + history * WEIGHT_HISTORY;

            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, candidate));
            }
        }

        let Some((score, candidate)) = best else {
            return EvalResult::not_found(ErrorKind::ElementNotFound);
        };

        if score < self.thresholds.reject_below {
            return EvalResult::not_found(ErrorKind::ElementNotFound);
        }

        EvalResult::found(
            score,
            ResolvedTarget {
                node_id: Some(candidate.node_id),
                bounding_rect: candidate.bounding_rect,
            },
        )
    }
}
