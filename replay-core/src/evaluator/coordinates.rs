//! Last-resort coordinate click (spec §4.3 `coordinates`).

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::strategy::{Rect, Strategy, StrategyKind, StrategyMetadata};

use super::{EvalResult, EvaluationContext, ResolvedTarget, StrategyEvaluator};

pub struct CoordinatesEvaluator;

const HANDLED: &[StrategyKind] = &[StrategyKind::Coordinates];

#[async_trait]
impl StrategyEvaluator for CoordinatesEvaluator {
    fn handled_kinds(&self) -> &'static [StrategyKind] {
        HANDLED
    }

    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult {
        let StrategyMetadata::Coordinates { x, y, relative_to } = &strategy.metadata else {
            return EvalResult::not_found(ErrorKind::InvalidMessage);
        };

        // Confidence is capped at the kind's base, regardless of the scorer's
        // input (spec §4.3 "confidence capped at its base 0.60").
        let confidence = strategy.confidence.min(StrategyKind::Coordinates.base_confidence());

        let Some(parent_selector) = relative_to else {
            return EvalResult::found(
                confidence,
                ResolvedTarget {
                    node_id: None,
                    bounding_rect: Rect { x: *x, y: *y, width: 1.0, height: 1.0 },
                },
            );
        };

        let ids = match ctx.cdp.query_selector_all(ctx.tab_id, parent_selector).await {
            Ok(ids) => ids,
            Err(_) => return EvalResult::not_found(ErrorKind::ElementNotFound),
        };
        let [parent_id] = ids.as_slice() else {
            return EvalResult::not_found(ErrorKind::ElementNotFound);
        };

        let state = match ctx.cdp.element_state(ctx.tab_id, *parent_id).await {
            Ok(state) => state,
            Err(_) => return EvalResult::not_found(ErrorKind::ElementNotFound),
        };

        EvalResult::found(
            confidence,
            ResolvedTarget {
                node_id: None,
                bounding_rect: Rect {
                    x: state.bounding_rect.x + x,
                    y: state.bounding_rect.y + y,
                    width: 1.0,
                    height: 1.0,
                },
            },
        )
    }
}
