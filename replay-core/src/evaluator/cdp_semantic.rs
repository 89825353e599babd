//! Accessibility-tree role+name resolution (spec §4.3 `cdp_semantic`).

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::ports::CdpNode;
use crate::strategy::{Strategy, StrategyKind, StrategyMetadata};

use super::{EvalResult, EvaluationContext, ResolvedTarget, StrategyEvaluator};

/// Implicit ARIA role for common interactive tags, used when the recorded
/// element had no explicit `role` attribute (spec §4.3).
fn implicit_role(tag: &str) -> Option<&'static str> {
    match tag.to_ascii_lowercase().as_str() {
        "button" => Some("button"),
        "a" => Some("link"),
        "input" => Some("textbox"),
        "select" => Some("combobox"),
        "textarea" => Some("textbox"),
        _ => None,
    }
}

fn matches_name(node: &CdpNode, name: &str, exact: bool) -> bool {
    let Some(candidate) = &node.accessible_name else {
        return false;
    };
    if exact {
        candidate.eq_ignore_ascii_case(name)
    } else {
        candidate.to_lowercase().contains(&name.to_lowercase())
    }
}

pub struct CdpSemanticEvaluator;

const HANDLED: &[StrategyKind] = &[StrategyKind::CdpSemantic];

#[async_trait]
impl StrategyEvaluator for CdpSemanticEvaluator {
    fn handled_kinds(&self) -> &'static [StrategyKind] {
        HANDLED
    }

    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult {
        let StrategyMetadata::CdpSemantic { role, accessible_name, exact, recorded_tag } = &strategy.metadata else {
            return EvalResult::not_found(ErrorKind::InvalidMessage);
        };

        let query_role = role.clone().or_else(|| implicit_role(recorded_tag).map(str::to_string));

        let nodes = match ctx
            .cdp
            .query_accessibility(ctx.tab_id, query_role.as_deref(), accessible_name, *exact)
            .await
        {
            Ok(nodes) => nodes,
            Err(_) => return EvalResult::not_found(ErrorKind::CdpTimeout),
        };

        let matching: Vec<&CdpNode> = nodes.iter().filter(|n| matches_name(n, accessible_name, *exact)).collect();

        match matching.as_slice() {
            [] => EvalResult::not_found(ErrorKind::ElementNotFound),
            [single] => EvalResult::found(
                strategy.confidence,
                ResolvedTarget {
                    node_id: Some(single.node_id),
                    bounding_rect: single.bounding_rect,
                },
            ),
            multiple => {
                // Ambiguous by name alone; the first accessibility-tree hit is
                // kept but at reduced confidence.
                let first = multiple[0];
                EvalResult::found(
                    strategy.confidence * 0.8,
                    ResolvedTarget {
                        node_id: Some(first.node_id),
                        bounding_rect: first.bounding_rect,
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_role_table_covers_common_tags() {
        assert_eq!(implicit_role("button"), Some("button"));
        assert_eq!(implicit_role("A"), Some("link"));
        assert_eq!(implicit_role("div"), None);
    }

    #[test]
    fn name_match_is_case_insensitive_substring_unless_exact() {
        let node = CdpNode {
            node_id: 1,
            role: Some("button".into()),
            accessible_name: Some("Submit Order".into()),
            bounding_rect: crate::strategy::Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
        };
        assert!(matches_name(&node, "submit", false));
        assert!(!matches_name(&node, "submit", true));
        assert!(matches_name(&node, "Submit Order", true));
    }
}
