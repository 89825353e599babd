//! Candidate production (spec §4.4, §5.3 "candidate-production mode, not
//! evaluate"). Each recognized kind of evidence yields zero or one candidate
//! `Strategy` at its canonical base confidence; the scorer and builder
//! downstream decide what survives into the final chain.

use crate::action::bundle::LocatorBundle;
use crate::capture::dom::{build_css_path, build_primary_selector, build_xpath_fallback};
use crate::capture::vision::VisionSnapshot;
use crate::config::ScoringThresholds;
use crate::record::event::EventContext;
use crate::strategy::{Strategy, StrategyKind, StrategyMetadata};

/// Produces every candidate the recorded evidence supports for one accepted
/// event. `vision` is `None` when that layer degraded or hasn't refreshed
/// yet (spec §4.1 failure semantics).
pub fn produce_candidates(
    ctx: &EventContext,
    bundle: &LocatorBundle,
    vision: Option<&VisionSnapshot>,
    max_selector_depth: u32,
    thresholds: &ScoringThresholds,
) -> Vec<Strategy> {
    let mut candidates = Vec::new();

    if let Some(s) = cdp_semantic_candidate(bundle) {
        candidates.push(s);
    }
    if let Some(s) = cdp_power_candidate(bundle) {
        candidates.push(s);
    }
    if let Some(s) = dom_selector_candidate(ctx, max_selector_depth) {
        candidates.push(s);
    }
    if let Some(s) = css_selector_candidate(ctx, max_selector_depth) {
        candidates.push(s);
    }
    candidates.push(evidence_scoring_candidate(bundle));
    if let Some(s) = vision_ocr_candidate(vision, thresholds) {
        candidates.push(s);
    }
    candidates.push(coordinates_candidate(ctx, bundle));

    candidates
}

fn cdp_semantic_candidate(bundle: &LocatorBundle) -> Option<Strategy> {
    let accessible_name = bundle.accessible_name.clone()?;
    if accessible_name.is_empty() {
        return None;
    }
    Some(Strategy::at_base_confidence(
        StrategyKind::CdpSemantic,
        StrategyMetadata::CdpSemantic {
            role: bundle.role.clone(),
            accessible_name,
            exact: false,
            recorded_tag: bundle.tag_name.clone(),
        },
    ))
}

fn cdp_power_candidate(bundle: &LocatorBundle) -> Option<Strategy> {
    let text = (!bundle.text_content.is_empty()).then(|| bundle.text_content.clone());
    let placeholder = bundle.placeholder.clone();
    let test_id = bundle.test_id.clone();

    if text.is_none() && placeholder.is_none() && test_id.is_none() {
        return None;
    }

    Some(Strategy::at_base_confidence(
        StrategyKind::CdpPower,
        StrategyMetadata::CdpPower {
            text,
            label_for: None,
            placeholder,
            test_id,
            alt: None,
            title: None,
            exact: false,
        },
    ))
}

fn dom_selector_candidate(ctx: &EventContext, max_selector_depth: u32) -> Option<Strategy> {
    let selector = build_primary_selector(&ctx.target_chain, max_selector_depth);
    if selector.is_empty() {
        return None;
    }
    let unique = selector.starts_with('#') || selector.starts_with("[data-testid");
    Some(Strategy::at_base_confidence(
        StrategyKind::DomSelector,
        StrategyMetadata::DomSelector { selector, unique },
    ))
}

fn css_selector_candidate(ctx: &EventContext, max_selector_depth: u32) -> Option<Strategy> {
    if ctx.target_chain.is_empty() {
        return None;
    }
    let path = build_css_path(&ctx.target_chain, max_selector_depth);
    let xpath_fallback = Some(build_xpath_fallback(&ctx.target_chain));
    Some(Strategy::at_base_confidence(
        StrategyKind::CssSelector,
        StrategyMetadata::CssSelector { path, xpath_fallback },
    ))
}

fn evidence_scoring_candidate(bundle: &LocatorBundle) -> Strategy {
    let recorded_data_attrs = bundle.data_attributes.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    Strategy::at_base_confidence(
        StrategyKind::EvidenceScoring,
        StrategyMetadata::EvidenceScoring {
            recorded_tag: bundle.tag_name.clone(),
            recorded_input_type: bundle.input_type.clone(),
            recorded_id: bundle.id.clone(),
            recorded_name: bundle.name.clone(),
            recorded_aria_label: bundle.accessible_name.clone(),
            recorded_data_attrs,
            recorded_bounds: bundle.bounding_rect,
            recorded_scroll: bundle.scroll_position,
        },
    )
}

fn vision_ocr_candidate(vision: Option<&VisionSnapshot>, thresholds: &ScoringThresholds) -> Option<Strategy> {
    let snapshot = vision?;
    if snapshot.text.is_empty() || snapshot.confidence < thresholds.ocr_confidence_floor {
        return None;
    }
    Some(Strategy::at_base_confidence(
        StrategyKind::VisionOcr,
        StrategyMetadata::VisionOcr {
            target_text: snapshot.text.clone(),
            recorded_bbox: snapshot.bbox,
        },
    ))
}

fn coordinates_candidate(ctx: &EventContext, bundle: &LocatorBundle) -> Strategy {
    let relative_to = bundle.context.nearest_container_selector.clone();
    let (x, y) = match &relative_to {
        Some(_) => (ctx.point.0 - bundle.bounding_rect.x, ctx.point.1 - bundle.bounding_rect.y),
        None => ctx.point,
    };
    Strategy::at_base_confidence(StrategyKind::Coordinates, StrategyMetadata::Coordinates { x, y, relative_to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::bundle::{ContextHints, FrameLocator};
    use crate::strategy::{Rect, ScrollPosition};
    use std::collections::HashMap;

    fn bundle() -> LocatorBundle {
        LocatorBundle {
            tag_name: "button".into(),
            input_type: None,
            id: Some("submit".into()),
            name: None,
            test_id: Some("submit-btn".into()),
            class_list: vec!["btn".into()],
            role: Some("button".into()),
            accessible_name: Some("Submit".into()),
            placeholder: None,
            data_attributes: HashMap::new(),
            bounding_rect: Rect { x: 10.0, y: 10.0, width: 40.0, height: 20.0 },
            scroll_position: ScrollPosition { x: 0.0, y: 0.0 },
            frame: FrameLocator::top_level(),
            text_content: "Submit".into(),
            context: ContextHints::default(),
        }
    }

    fn ctx() -> EventContext {
        EventContext {
            point: (30.0, 20.0),
            scroll_position: ScrollPosition { x: 0.0, y: 0.0 },
            target_chain: vec![],
            frame: FrameLocator::top_level(),
            timestamp_ms: 0,
            prior_labels: vec![],
            page_url: "/checkout".into(),
        }
    }

    #[test]
    fn produces_semantic_power_evidence_and_coordinates_candidates() {
        let candidates = produce_candidates(&ctx(), &bundle(), None, 6, &ScoringThresholds::default());
        let kinds: Vec<_> = candidates.iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&StrategyKind::CdpSemantic));
        assert!(kinds.contains(&StrategyKind::CdpPower));
        assert!(kinds.contains(&StrategyKind::EvidenceScoring));
        assert!(kinds.contains(&StrategyKind::Coordinates));
        assert!(!kinds.contains(&StrategyKind::VisionOcr));
    }

    #[test]
    fn low_confidence_ocr_is_dropped() {
        let vision = VisionSnapshot {
            text: "Submit".into(),
            bbox: Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
            confidence: 10,
        };
        let candidates = produce_candidates(&ctx(), &bundle(), Some(&vision), 6, &ScoringThresholds::default());
        assert!(!candidates.iter().any(|s| s.kind == StrategyKind::VisionOcr));
    }

    #[test]
    fn sufficiently_confident_ocr_is_kept() {
        let vision = VisionSnapshot {
            text: "Submit".into(),
            bbox: Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
            confidence: 90,
        };
        let candidates = produce_candidates(&ctx(), &bundle(), Some(&vision), 6, &ScoringThresholds::default());
        assert!(candidates.iter().any(|s| s.kind == StrategyKind::VisionOcr));
    }
}
