//! Raw event types shared by `EventSource`, `EventFilter`, and the capture
//! layers (spec §4.1, §4.2).

use crate::action::bundle::FrameLocator;
use crate::strategy::{Rect, ScrollPosition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The DOM event kinds `EventSource` subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Input,
    Keydown,
}

/// An opaque reference to a DOM node in the host page, resolved by the
/// host's bridge. replay-core never inspects page internals directly — a
/// `NodeDescriptor` is a synchronous, in-page snapshot the host's event
/// bridge reads at the moment the trusted event fires, before any
/// cross-process RPC is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetHandle(pub String);

/// A single node's structural description, as read synchronously by the
/// host bridge when an event fires. Ancestor chains of these let the
/// `TargetResolver` and `DomCapture` walk up and build selectors without a
/// live DOM handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub handle: TargetHandle,
    pub tag_name: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// All other attributes, including `data-*`, `aria-*`, `role`, `name`,
    /// `placeholder`, `alt`, `title`, `type`, `for`.
    pub attributes: HashMap<String, String>,
    pub text_content: String,
    pub bounding_rect: Rect,
    pub computed_visible: bool,
    pub cursor_pointer: bool,
    pub tabindex: Option<i32>,
    pub content_editable: bool,
    pub has_onclick: bool,
    pub is_svg: bool,
    /// 1-based index among siblings sharing this tag name, for XPath segments.
    pub sibling_index: u32,
}

impl NodeDescriptor {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn is_interactive_tag(&self) -> bool {
        matches!(
            self.tag_name.to_ascii_lowercase().as_str(),
            "a" | "button" | "input" | "select" | "textarea" | "option" | "label"
        )
    }

    pub fn interactive_role(&self) -> bool {
        matches!(
            self.attr("role").map(|r| r.to_ascii_lowercase()).as_deref(),
            Some(
                "button" | "link" | "checkbox" | "radio" | "menuitem" | "tab" | "switch"
                    | "combobox" | "option"
            )
        )
    }

    /// Whether this node itself satisfies the resolver's "interactive ancestor" test.
    pub fn is_interactive(&self) -> bool {
        self.is_interactive_tag()
            || self.interactive_role()
            || self.attr("onclick").is_some()
            || self.has_onclick
            || self.attr("tabindex").is_some()
            || self.content_editable
    }
}

/// A raw event as reported by the host's DOM event subscription, before
/// filtering or target resolution.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub kind: EventKind,
    /// `false` for script-dispatched (non-trusted) events; rejected by the filter.
    pub is_trusted: bool,
    /// Viewport-relative click/pointer coordinates, when applicable.
    pub point: Option<(f64, f64)>,
    /// The resolved target and its ancestor chain, target first, document
    /// root last.
    pub target_chain: Vec<NodeDescriptor>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub timestamp_ms: u64,
    pub scroll_position: ScrollPosition,
    /// Frame context at the moment the event fired, read synchronously by
    /// the host's `frameElement`-walking bridge (fails closed — empty — on
    /// cross-origin, spec §4.1). Never recomputed downstream.
    pub frame: FrameLocator,
    pub page_url: String,
}

impl RawEvent {
    pub fn target(&self) -> Option<&NodeDescriptor> {
        self.target_chain.first()
    }
}

/// Everything the capture layers and chain generator need about the page at
/// the moment an event was accepted.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub point: (f64, f64),
    pub scroll_position: ScrollPosition,
    /// The resolved target (post `TargetResolver`) and its ancestor chain.
    pub target_chain: Vec<NodeDescriptor>,
    pub frame: FrameLocator,
    pub timestamp_ms: u64,
    /// Step labels accepted so far this recording, for sequence-pattern learning.
    pub prior_labels: Vec<String>,
    /// The page URL (pattern-wildcarded for sequence learning happens downstream).
    pub page_url: String,
}

impl EventContext {
    pub fn target(&self) -> Option<&NodeDescriptor> {
        self.target_chain.first()
    }
}
