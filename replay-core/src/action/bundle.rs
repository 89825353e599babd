//! Record-time element description consumed by most evaluators (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::strategy::{Rect, ScrollPosition};

/// Ordered frame context crossed to reach the captured element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameLocator {
    /// Iframe indices from the top frame down.
    pub iframe_chain: Vec<u32>,
    /// Selector naming each shadow host crossed, outermost first.
    pub shadow_host_chain: Vec<String>,
}

impl FrameLocator {
    pub fn top_level() -> Self {
        Self::default()
    }

    pub fn is_top_level(&self) -> bool {
        self.iframe_chain.is_empty() && self.shadow_host_chain.is_empty()
    }
}

/// Boolean context hints set by the target resolver (spec §4.2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHints {
    pub is_terminal_like: bool,
    pub is_editor_like: bool,
    pub is_chat_like: bool,
    /// Selector of the nearest semantically meaningful container, if any.
    pub nearest_container_selector: Option<String>,
}

/// The element snapshot captured at record time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorBundle {
    // Identity
    pub tag_name: String,
    /// `<input>`/`<select>` `type` attribute, if any.
    pub input_type: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub test_id: Option<String>,
    pub class_list: Vec<String>,
    pub role: Option<String>,
    pub accessible_name: Option<String>,
    pub placeholder: Option<String>,
    pub data_attributes: HashMap<String, String>,

    // Geometry
    pub bounding_rect: Rect,
    pub scroll_position: ScrollPosition,

    // Frame context
    pub frame: FrameLocator,

    // Text
    pub text_content: String,

    // Context hints
    pub context: ContextHints,
}

impl LocatorBundle {
    /// Bounded, trimmed text content, per the "trimmed, bounded" invariant.
    pub fn set_text_content(&mut self, raw: &str, max_len: usize) {
        let trimmed = raw.trim();
        self.text_content = if trimmed.chars().count() > max_len {
            trimmed.chars().take(max_len).collect()
        } else {
            trimmed.to_string()
        };
    }
}
