//! Kind-specific metadata carried by a [`super::Strategy`].
//!
//! Each variant carries exactly the fields its evaluator needs to resolve
//! the strategy against a foreign DOM without the original element (spec
//! §3 invariant).

use serde::{Deserialize, Serialize};

/// A bounding rect, viewport-relative, as captured at record time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyMetadata {
    CdpSemantic {
        role: Option<String>,
        accessible_name: String,
        exact: bool,
        /// Recorded tag name, used to look up an implicit ARIA role when
        /// `role` is absent (spec §4.3 "implicit role-from-tag fallback").
        recorded_tag: String,
    },
    CdpPower {
        text: Option<String>,
        label_for: Option<String>,
        placeholder: Option<String>,
        test_id: Option<String>,
        alt: Option<String>,
        title: Option<String>,
        exact: bool,
    },
    DomSelector {
        selector: String,
        unique: bool,
    },
    CssSelector {
        path: String,
        /// Sibling-index XPath fallback recorded alongside the CSS path.
        xpath_fallback: Option<String>,
    },
    EvidenceScoring {
        /// Snapshot of recorded identity used to re-score candidates on replay.
        recorded_tag: String,
        /// `<input>`/`<select>` `type` attribute, for the visual axis's
        /// tag-and-input-type agreement check (spec §4.3).
        recorded_input_type: Option<String>,
        recorded_id: Option<String>,
        recorded_name: Option<String>,
        recorded_aria_label: Option<String>,
        recorded_data_attrs: Vec<(String, String)>,
        recorded_bounds: Rect,
        recorded_scroll: ScrollPosition,
    },
    VisionOcr {
        target_text: String,
        recorded_bbox: Rect,
    },
    Coordinates {
        x: f64,
        y: f64,
        relative_to: Option<String>,
    },
}

impl StrategyMetadata {
    /// `true` if this metadata uses the element-relative coordinate form and
    /// names the parent selector to resolve first.
    pub fn coordinate_parent(&self) -> Option<&str> {
        match self {
            Self::Coordinates {
                relative_to: Some(sel),
                ..
            } => Some(sel.as_str()),
            _ => None,
        }
    }
}
