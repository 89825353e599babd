//! Confidence scoring applied to capture-time candidates (spec §5.3):
//! evidence-quality (handled upstream in `chain::generator`), selector-
//! specificity, and a live-DOM uniqueness check that demotes or drops
//! non-unique selector candidates.

use tracing::debug;

use crate::ports::CdpPort;
use crate::strategy::{Strategy, StrategyKind, StrategyMetadata};

/// Multiplier for confidence by how specific the underlying selector is:
/// id > test-id > role+name > class path > bare tag.
fn specificity_factor(strategy: &Strategy) -> f64 {
    match (&strategy.kind, &strategy.metadata) {
        (StrategyKind::DomSelector, StrategyMetadata::DomSelector { selector, .. }) => {
            if selector.starts_with('#') {
                1.0
            } else if selector.starts_with("[data-testid") {
                0.95
            } else if selector.contains('.') {
                0.85
            } else {
                0.7
            }
        }
        (StrategyKind::CssSelector, _) => 0.8,
        (StrategyKind::CdpSemantic, _) => 0.92,
        _ => 1.0,
    }
}

fn selector_of(strategy: &Strategy) -> Option<&str> {
    match &strategy.metadata {
        StrategyMetadata::DomSelector { selector, .. } => Some(selector),
        StrategyMetadata::CssSelector { path, .. } => Some(path),
        _ => None,
    }
}

pub struct StrategyScorer;

impl StrategyScorer {
    /// Applies specificity weighting to every candidate, then checks
    /// selector-based candidates against the live DOM: zero matches drops
    /// the candidate, more than one halves its confidence.
    pub async fn score(candidates: Vec<Strategy>, cdp: &dyn CdpPort, tab_id: &str) -> Vec<Strategy> {
        let mut scored = Vec::with_capacity(candidates.len());

        for mut strategy in candidates {
            strategy.confidence *= specificity_factor(&strategy);

            if let Some(selector) = selector_of(&strategy) {
                match cdp.query_selector_all(tab_id, selector).await {
                    Ok(matches) if matches.len() == 1 => {}
                    Ok(matches) if matches.len() > 1 => {
                        debug!(selector, count = matches.len(), "candidate selector is not unique, demoting");
                        strategy.confidence *= 0.5;
                    }
                    _ => {
                        debug!(selector, "candidate selector does not resolve, dropping");
                        continue;
                    }
                }
            }

            strategy.confidence = strategy.confidence.clamp(0.0, 1.0);
            scored.push(strategy);
        }

        scored
    }
}
