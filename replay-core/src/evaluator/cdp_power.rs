//! Text/label-for/placeholder/test-id/alt/title predicate matching over the
//! live accessibility tree (spec §4.3 `cdp_power`).

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::ports::CdpNode;
use crate::strategy::{Strategy, StrategyKind, StrategyMetadata};

use super::{EvalResult, EvaluationContext, ResolvedTarget, StrategyEvaluator};

pub struct CdpPowerEvaluator;

const HANDLED: &[StrategyKind] = &[StrategyKind::CdpPower];

fn text_matches(candidate: &str, recorded: &str, exact: bool) -> bool {
    if exact {
        candidate.eq_ignore_ascii_case(recorded)
    } else {
        candidate.to_lowercase().contains(&recorded.to_lowercase())
    }
}

#[async_trait]
impl StrategyEvaluator for CdpPowerEvaluator {
    fn handled_kinds(&self) -> &'static [StrategyKind] {
        HANDLED
    }

    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult {
        let StrategyMetadata::CdpPower {
            text,
            label_for,
            placeholder,
            test_id,
            alt,
            title,
            exact,
        } = &strategy.metadata
        else {
            return EvalResult::not_found(ErrorKind::InvalidMessage);
        };

        // Each populated predicate is tried as an independent accessibility-
        // name query, in the order the spec lists them; the first unique hit
        // wins.
        let candidates: [Option<&str>; 6] = [
            text.as_deref(),
            label_for.as_deref(),
            placeholder.as_deref(),
            test_id.as_deref(),
            alt.as_deref(),
            title.as_deref(),
        ];

        for needle in candidates.into_iter().flatten() {
            let nodes = match ctx.cdp.query_accessibility(ctx.tab_id, None, needle, *exact).await {
                Ok(nodes) => nodes,
                Err(_) => continue,
            };
            let matching: Vec<&CdpNode> = nodes
                .iter()
                .filter(|n| n.accessible_name.as_deref().is_some_and(|name| text_matches(name, needle, *exact)))
                .collect();
            if let [single] = matching.as_slice() {
                return EvalResult::found(
                    strategy.confidence,
                    ResolvedTarget {
                        node_id: Some(single.node_id),
                        bounding_rect: single.bounding_rect,
                    },
                );
            }
        }

        EvalResult::not_found(ErrorKind::ElementNotFound)
    }
}
