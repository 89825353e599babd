//! Host RPC ports: the boundary between replay-core and its host (spec §6,
//! §9 design notes). Every call returns `Result<T>`; a `{ok: false}` host
//! reply is mapped to `Error::Port` with the matching `ErrorKind`.
//!
//! Implementations are supplied by the embedder (browser extension
//! background context, test harness, etc.) — replay-core never assumes a
//! concrete transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::strategy::{Rect, ScrollPosition};

/// `CAPTURE_SCREENSHOT` / `RUN_OCR` host RPCs.
#[async_trait]
pub trait VisionPort: Send + Sync {
    async fn capture_screenshot(&self, tab_id: &str) -> Result<Vec<u8>>;
    async fn recognize(&self, image: &[u8], region: Option<(f64, f64, f64, f64)>) -> Result<OcrResult>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub confidence: u8,
    pub bbox: Rect,
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: u8,
    pub bbox: Rect,
}

/// A DOM node resolved by a CDP/accessibility-tree query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpNode {
    pub node_id: u64,
    pub role: Option<String>,
    pub accessible_name: Option<String>,
    pub bounding_rect: Rect,
}

/// `CDP_ATTACH` / `CDP_DETACH` / `CDP_COMMAND` debugger-protocol port.
#[async_trait]
pub trait CdpPort: Send + Sync {
    async fn attach(&self, tab_id: &str) -> Result<()>;
    async fn detach(&self, tab_id: &str) -> Result<()>;

    /// Queries the accessibility tree for nodes matching `role`/`name`.
    async fn query_accessibility(
        &self,
        tab_id: &str,
        role: Option<&str>,
        name: &str,
        exact: bool,
    ) -> Result<Vec<CdpNode>>;

    /// Resolves a selector or XPath to matching node ids in the live DOM.
    async fn query_selector_all(&self, tab_id: &str, selector: &str) -> Result<Vec<u64>>;

    /// A single bundled read of the predicates `Actionability` polls and the
    /// bounding rect evaluators need when their resolution call didn't
    /// already return one (e.g. `query_selector_all`).
    async fn element_state(&self, tab_id: &str, node_id: u64) -> Result<ElementState>;

    /// Every live node sharing `tag_name`, with the identity fields
    /// `EvidenceScoringEvaluator` scores against (spec §4.3 "candidate pool
    /// via the target-resolver's rules").
    async fn query_candidates_by_tag(&self, tab_id: &str, tag_name: &str) -> Result<Vec<EvidenceCandidateNode>>;

    /// Current page scroll offset, for the spatial axis's scroll
    /// compensation (spec §4.8).
    async fn current_scroll(&self, tab_id: &str) -> Result<ScrollPosition>;
}

/// A live DOM node's identity snapshot, read fresh for evidence-based
/// re-scoring (spec §4.3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCandidateNode {
    pub node_id: u64,
    pub tag_name: String,
    /// `<input>`/`<select>` `type` attribute, if any.
    pub input_type: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub aria_label: Option<String>,
    pub data_attributes: HashMap<String, String>,
    pub bounding_rect: Rect,
}

/// Live state of a resolved node, read fresh on every `Actionability` poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElementState {
    pub attached: bool,
    pub computed_visible: bool,
    pub enabled: bool,
    pub bounding_rect: Rect,
}

/// The primitive action kinds `ActionDispatcher` can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    Click,
    Type,
    Enter,
    Keypress,
    Select,
}

/// `ACTION_DISPATCH` — primitive input synthesis, kept behind a port because
/// the synthesis mechanism (trusted event sequences, prototype value-setter
/// bypass) is host/page-context specific.
#[async_trait]
pub trait InputSynthesisPort: Send + Sync {
    /// Dispatch against a live DOM node, the common case for semantic,
    /// power, DOM-selector, and evidence-scoring resolutions.
    async fn dispatch(
        &self,
        tab_id: &str,
        node_id: u64,
        kind: DispatchKind,
        value: Option<&str>,
    ) -> Result<()>;

    /// Dispatch at a viewport point with no backing node handle — the only
    /// option for a vision or raw-coordinates resolution.
    async fn dispatch_at_point(
        &self,
        tab_id: &str,
        point: (f64, f64),
        kind: DispatchKind,
        value: Option<&str>,
    ) -> Result<()>;
}

/// `fetch`/`XMLHttpRequest` interception, owned by `NetworkCapture`'s host
/// counterpart; transparently restored on `stop()`.
#[async_trait]
pub trait NetworkInterceptorPort: Send + Sync {
    async fn start_intercepting(&self, tab_id: &str) -> Result<()>;
    async fn stop_intercepting(&self, tab_id: &str) -> Result<()>;
}
