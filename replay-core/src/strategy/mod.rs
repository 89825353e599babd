//! The `Strategy` data model: a self-contained description of how to locate
//! one element by one method, with a confidence (spec §3, §GLOSSARY).

mod metadata;

pub use metadata::{Rect, ScrollPosition, StrategyMetadata};

use serde::{Deserialize, Serialize};

/// One of the seven locator strategy kinds, in the order the spec lists
/// their canonical base confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CdpSemantic,
    CdpPower,
    DomSelector,
    EvidenceScoring,
    CssSelector,
    VisionOcr,
    Coordinates,
}

impl StrategyKind {
    /// Canonical base confidence for this kind, before the scorer applies
    /// evidence-quality, specificity, and uniqueness factors.
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::CdpSemantic => 0.95,
            Self::CdpPower => 0.90,
            Self::DomSelector => 0.85,
            Self::EvidenceScoring => 0.80,
            Self::CssSelector => 0.75,
            Self::VisionOcr => 0.70,
            Self::Coordinates => 0.60,
        }
    }

    /// Broad category used for chain diversity and tie-breaking (§4.4, §4.5).
    /// Strategies in a chain should cover each category the capture evidence
    /// permitted, and equal-confidence ties favor the more semantic category.
    pub fn category(self) -> StrategyCategory {
        match self {
            Self::CdpSemantic => StrategyCategory::Semantic,
            Self::CdpPower | Self::DomSelector | Self::CssSelector => StrategyCategory::Dom,
            Self::EvidenceScoring => StrategyCategory::Evidence,
            Self::VisionOcr => StrategyCategory::Vision,
            Self::Coordinates => StrategyCategory::Coordinates,
        }
    }
}

/// Broad strategy category. Ordering here doubles as the tie-break order:
/// `Semantic > Dom > Evidence > Vision > Coordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Semantic = 0,
    Dom = 1,
    Evidence = 2,
    Vision = 3,
    Coordinates = 4,
}

/// A single located-by-one-method description with its effective confidence.
///
/// Strategies are values: no back-references to the `Action` or chain that
/// contains them (spec §9 design notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    /// Effective confidence in `[0, 1]`, after scoring — may differ from
    /// `kind.base_confidence()` once the scorer's factors are applied.
    pub confidence: f64,
    pub metadata: StrategyMetadata,
}

impl Strategy {
    pub fn new(kind: StrategyKind, confidence: f64, metadata: StrategyMetadata) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            metadata,
        }
    }

    /// Construct a strategy at its unscored, canonical base confidence.
    pub fn at_base_confidence(kind: StrategyKind, metadata: StrategyMetadata) -> Self {
        Self::new(kind, kind.base_confidence(), metadata)
    }

    pub fn category(&self) -> StrategyCategory {
        self.kind.category()
    }

    /// Identity used for chain deduplication: two strategies are redundant
    /// if they share both kind and metadata.
    pub fn identity_key(&self) -> (StrategyKind, String) {
        let metadata_json =
            serde_json::to_string(&self.metadata).unwrap_or_default();
        (self.kind, metadata_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_confidences_match_spec_table() {
        assert_eq!(StrategyKind::CdpSemantic.base_confidence(), 0.95);
        assert_eq!(StrategyKind::CdpPower.base_confidence(), 0.90);
        assert_eq!(StrategyKind::DomSelector.base_confidence(), 0.85);
        assert_eq!(StrategyKind::EvidenceScoring.base_confidence(), 0.80);
        assert_eq!(StrategyKind::CssSelector.base_confidence(), 0.75);
        assert_eq!(StrategyKind::VisionOcr.base_confidence(), 0.70);
        assert_eq!(StrategyKind::Coordinates.base_confidence(), 0.60);
    }

    #[test]
    fn category_order_matches_tie_break_rule() {
        assert!(StrategyCategory::Semantic < StrategyCategory::Dom);
        assert!(StrategyCategory::Dom < StrategyCategory::Evidence);
        assert!(StrategyCategory::Evidence < StrategyCategory::Vision);
        assert!(StrategyCategory::Vision < StrategyCategory::Coordinates);
    }

    #[test]
    fn confidence_is_clamped() {
        let s = Strategy::new(
            StrategyKind::Coordinates,
            1.5,
            StrategyMetadata::Coordinates {
                x: 0.0,
                y: 0.0,
                relative_to: None,
            },
        );
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn identity_key_distinguishes_metadata() {
        let a = Strategy::at_base_confidence(
            StrategyKind::DomSelector,
            StrategyMetadata::DomSelector {
                selector: "#a".into(),
                unique: true,
            },
        );
        let b = Strategy::at_base_confidence(
            StrategyKind::DomSelector,
            StrategyMetadata::DomSelector {
                selector: "#b".into(),
                unique: true,
            },
        );
        assert_ne!(a.identity_key(), b.identity_key());
    }
}
