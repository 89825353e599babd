//! Final chain assembly (spec §5.3, resolving §9's fallback-chain-order
//! Open Question as a correctness requirement): selects 5-7 strategies,
//! guarantees category diversity where the evidence supports it, rejects
//! redundant `(kind, metadata)` pairs, and sorts by effective confidence
//! descending so `fallback_chain[0]` is always the primary strategy.

use std::collections::HashSet;

use crate::action::FallbackChain;
use crate::error::Result;
use crate::strategy::{Strategy, StrategyCategory};

const MIN_CHAIN_LEN: usize = 5;
const MAX_CHAIN_LEN: usize = 7;

/// Categories the builder guarantees at least one representative of, when
/// the capture evidence produced a candidate in that category at all
/// (spec §5.3).
const GUARANTEED_CATEGORIES: &[StrategyCategory] = &[
    StrategyCategory::Semantic,
    StrategyCategory::Dom,
    StrategyCategory::Vision,
    StrategyCategory::Coordinates,
];

pub struct StrategyChainBuilder;

impl StrategyChainBuilder {
    /// Builds the final, validated chain from scored candidates.
    pub fn build(mut candidates: Vec<Strategy>) -> Result<FallbackChain> {
        dedupe_by_identity(&mut candidates);
        sort_by_confidence_then_category(&mut candidates);

        let mut selected: Vec<Strategy> = candidates.iter().take(MAX_CHAIN_LEN).cloned().collect();

        for &category in GUARANTEED_CATEGORIES {
            if selected.iter().any(|s| s.category() == category) {
                continue;
            }
            let Some(best_of_category) = candidates.iter().find(|s| s.category() == category) else {
                continue;
            };
            if selected.len() < MAX_CHAIN_LEN {
                selected.push(best_of_category.clone());
            } else if let Some(worst_idx) = lowest_confidence_replaceable_index(&selected, GUARANTEED_CATEGORIES) {
                selected[worst_idx] = best_of_category.clone();
            }
        }

        if selected.len() < MIN_CHAIN_LEN {
            for candidate in &candidates {
                if selected.len() >= MIN_CHAIN_LEN {
                    break;
                }
                if !selected.iter().any(|s| s.identity_key() == candidate.identity_key()) {
                    selected.push(candidate.clone());
                }
            }
        }

        sort_by_confidence_then_category(&mut selected);
        FallbackChain::new(selected)
    }
}

fn dedupe_by_identity(candidates: &mut Vec<Strategy>) {
    let mut seen = HashSet::new();
    candidates.retain(|s| seen.insert(s.identity_key()));
}

fn sort_by_confidence_then_category(candidates: &mut [Strategy]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category().cmp(&b.category()))
    });
}

/// The lowest-confidence entry in `selected` that is safe to evict without
/// breaking one of the already-satisfied category guarantees.
fn lowest_confidence_replaceable_index(selected: &[Strategy], guaranteed: &[StrategyCategory]) -> Option<usize> {
    selected
        .iter()
        .enumerate()
        .filter(|(i, s)| {
            let is_sole_representative = guaranteed.contains(&s.category())
                && selected.iter().filter(|other| other.category() == s.category()).count() == 1;
            !is_sole_representative && *i < selected.len()
        })
        .min_by(|(_, a), (_, b)| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}
