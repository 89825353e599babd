//! DOM structural evidence collector (spec §4.1 `DOMCapture`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::action::bundle::{ContextHints, LocatorBundle};
use crate::record::event::{EventContext, NodeDescriptor};

use super::CaptureLayer;

/// Lightweight change-detection snapshot, distinct from the full
/// `LocatorBundle` (spec §3: bundle and evidence are separate fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvidence {
    /// SHA-256 of the target's tag + id + class + text, for cheap dedup.
    pub content_hash: String,
    pub ancestor_depth: usize,
}

fn dynamic_token_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // Emotion / styled-components hashes: css-1a2b3c4, sc-bdVaJa
            Regex::new(r"^css-[a-z0-9]{6,}$").unwrap(),
            Regex::new(r"^sc-[A-Za-z0-9]{6,}$").unwrap(),
            // UUIDs
            Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap(),
            // Purely numeric tokens
            Regex::new(r"^\d+$").unwrap(),
            // React-style generated ids: :r1a:
            Regex::new(r"^:r[0-9a-z]+:$").unwrap(),
            // Long opaque hash-like tokens (8+ hex-ish chars, no vowels pattern)
            Regex::new(r"^[a-z0-9]{10,}$").unwrap(),
        ]
    })
}

/// `true` if `token` looks machine-generated and should be filtered out of
/// selector candidates (spec §4.1).
pub fn is_dynamic_token(token: &str) -> bool {
    dynamic_token_patterns().iter().any(|re| re.is_match(token))
}

fn stable_id(id: &str) -> bool {
    !id.is_empty() && !is_dynamic_token(id)
}

fn stable_classes(classes: &[String]) -> Vec<String> {
    classes
        .iter()
        .filter(|c| !c.is_empty() && !is_dynamic_token(c))
        .cloned()
        .collect()
}

/// Build the primary selector by priority: `[data-testid]` -> `#id` (if
/// stable) -> a minimal unique CSS path up to `max_depth` ancestors.
pub fn build_primary_selector(chain: &[NodeDescriptor], max_depth: u32) -> String {
    let Some(target) = chain.first() else {
        return String::new();
    };

    if let Some(test_id) = target.attr("data-testid") {
        if !test_id.is_empty() {
            return format!("[data-testid=\"{}\"]", css_escape(test_id));
        }
    }

    if let Some(id) = &target.id {
        if stable_id(id) {
            return format!("#{}", css_escape(id));
        }
    }

    build_css_path(chain, max_depth)
}

/// A minimal CSS path: tag + stable classes for each ancestor up to
/// `max_depth`, most specific (target) last... rendered target-down, i.e.
/// `ancestor > ... > target`.
pub fn build_css_path(chain: &[NodeDescriptor], max_depth: u32) -> String {
    let depth = (max_depth as usize).min(chain.len()).max(1);
    let mut segments: Vec<String> = chain[..depth]
        .iter()
        .map(|node| {
            let tag = node.tag_name.to_ascii_lowercase();
            let classes = stable_classes(&node.classes);
            if classes.is_empty() {
                tag
            } else {
                format!("{}.{}", tag, classes.join("."))
            }
        })
        .collect();
    segments.reverse();
    segments.join(" > ")
}

/// Position-based XPath fallback: 1-based sibling indices, tag-name segments.
pub fn build_xpath_fallback(chain: &[NodeDescriptor]) -> String {
    let mut segments: Vec<String> = chain
        .iter()
        .map(|node| format!("{}[{}]", node.tag_name.to_ascii_lowercase(), node.sibling_index.max(1)))
        .collect();
    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// Accessible-name resolution chain: aria-label -> aria-labelledby (treated
/// as an already-resolved string by the host bridge) -> label[for] ->
/// placeholder -> alt -> element text.
pub fn resolve_accessible_name(target: &NodeDescriptor) -> Option<String> {
    target
        .attr("aria-label")
        .filter(|s| !s.is_empty())
        .or_else(|| target.attr("aria-labelledby-text").filter(|s| !s.is_empty()))
        .or_else(|| target.attr("label-for-text").filter(|s| !s.is_empty()))
        .or_else(|| target.attr("placeholder").filter(|s| !s.is_empty()))
        .or_else(|| target.attr("alt").filter(|s| !s.is_empty()))
        .map(str::to_string)
        .or_else(|| {
            let text = target.text_content.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        })
}

fn css_escape(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// Collects the `LocatorBundle` for an accepted event.
pub struct DomCapture {
    running: bool,
    max_selector_depth: u32,
    text_bound: usize,
}

impl DomCapture {
    pub fn new(max_selector_depth: u32) -> Self {
        Self {
            running: false,
            max_selector_depth,
            text_bound: 500,
        }
    }

    /// Builds the full `LocatorBundle` for the current event context,
    /// independent of the lightweight `DomEvidence` returned by `snapshot`.
    pub fn build_bundle(&self, ctx: &EventContext) -> Option<LocatorBundle> {
        let target = ctx.target()?;

        let mut data_attributes = std::collections::HashMap::new();
        for (k, v) in &target.attributes {
            if let Some(name) = k.strip_prefix("data-") {
                data_attributes.insert(name.to_string(), v.clone());
            }
        }

        let context = ContextHints {
            is_terminal_like: target.attr("data-terminal").is_some(),
            is_editor_like: target.content_editable
                || target.attr("data-editor").is_some(),
            is_chat_like: target.attr("data-chat").is_some(),
            nearest_container_selector: ctx
                .target_chain
                .iter()
                .skip(1)
                .find(|n| n.attr("role").is_some() || n.attr("data-testid").is_some())
                .map(|n| build_primary_selector(std::slice::from_ref(n), 1)),
        };

        let mut bundle = LocatorBundle {
            tag_name: target.tag_name.clone(),
            input_type: target.attr("type").map(str::to_string),
            id: target.id.clone(),
            name: target.attr("name").map(str::to_string),
            test_id: target.attr("data-testid").map(str::to_string),
            class_list: target.classes.clone(),
            role: target.attr("role").map(str::to_string),
            accessible_name: resolve_accessible_name(target),
            placeholder: target.attr("placeholder").map(str::to_string),
            data_attributes,
            bounding_rect: target.bounding_rect,
            scroll_position: ctx.scroll_position,
            frame: ctx.frame.clone(),
            text_content: String::new(),
            context,
        };
        bundle.set_text_content(&target.text_content, self.text_bound);
        Some(bundle)
    }

    pub fn primary_selector(&self, ctx: &EventContext) -> String {
        build_primary_selector(&ctx.target_chain, self.max_selector_depth)
    }

    pub fn xpath_fallback(&self, ctx: &EventContext) -> String {
        build_xpath_fallback(&ctx.target_chain)
    }
}

impl CaptureLayer for DomCapture {
    type Snapshot = DomEvidence;

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn snapshot(&self, ctx: &EventContext) -> Option<DomEvidence> {
        if !self.running {
            return None;
        }
        let target = ctx.target()?;
        let mut hasher = sha2::Sha256::new();
        use sha2::Digest;
        hasher.update(target.tag_name.as_bytes());
        if let Some(id) = &target.id {
            hasher.update(id.as_bytes());
        }
        hasher.update(target.classes.join(".").as_bytes());
        hasher.update(target.text_content.as_bytes());
        let hash = hasher.finalize();
        Some(DomEvidence {
            content_hash: format!("{:x}", hash),
            ancestor_depth: ctx.target_chain.len(),
        })
    }
}
