//! Rejects events before they reach the `TargetResolver` (spec §4.2
//! `EventFilter`): synthetic events, blocked/invisible targets, debounced
//! duplicates, and non-interactive click targets.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

use super::event::{EventKind, NodeDescriptor, RawEvent};

fn blocked_class_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)scrollbar").unwrap(),
            Regex::new(r"(?i)resize-handle").unwrap(),
            Regex::new(r"(?i)resizer").unwrap(),
        ]
    })
}

/// Debounces, rejects synthetic/invisible/blocked events, and normalizes
/// duplicates (spec §4.2).
pub struct EventFilter {
    debounce_ms: u64,
    last_seen: Mutex<HashMap<String, u64>>,
}

impl EventFilter {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// `true` if `event` should be passed on to the `TargetResolver`.
    pub fn accept(&self, event: &RawEvent) -> bool {
        if !event.is_trusted {
            return false;
        }
        let Some(target) = event.target() else {
            return false;
        };

        if is_blocked(target) {
            return false;
        }
        if !target.computed_visible {
            return false;
        }
        if event.kind == EventKind::Click && !click_target_is_interactive(event, target) {
            return false;
        }
        if self.is_duplicate(event, target) {
            return false;
        }

        true
    }

    fn is_duplicate(&self, event: &RawEvent, target: &NodeDescriptor) -> bool {
        let key = dedup_key(event, target);
        let mut seen = self.last_seen.lock().expect("event filter dedup lock poisoned");
        let now = event.timestamp_ms;

        if let Some(&last) = seen.get(&key) {
            if now.saturating_sub(last) < self.debounce_ms {
                return true;
            }
        }
        seen.insert(key, now);
        false
    }
}

fn is_blocked(target: &NodeDescriptor) -> bool {
    if target.attr("aria-hidden") == Some("true") {
        return true;
    }
    blocked_class_patterns()
        .iter()
        .any(|pattern| target.classes.iter().any(|class| pattern.is_match(class)))
}

/// Terminal/editor-like containers admit clicks on elements that would
/// otherwise be rejected as non-interactive (spec §4.2).
fn inside_terminal_or_editor_container(chain: &[NodeDescriptor]) -> bool {
    chain.iter().any(|node| {
        node.content_editable || node.attr("data-terminal").is_some() || node.attr("data-editor").is_some()
    })
}

fn click_target_is_interactive(event: &RawEvent, target: &NodeDescriptor) -> bool {
    target.is_interactive() || target.cursor_pointer || inside_terminal_or_editor_container(&event.target_chain)
}

/// Dedup key: event kind + tag + id + rounded coordinates (spec §4.2).
fn dedup_key(event: &RawEvent, target: &NodeDescriptor) -> String {
    let (x, y) = event.point.unwrap_or((0.0, 0.0));
    format!(
        "{:?}:{}:{}:{}:{}",
        event.kind,
        target.tag_name,
        target.id.as_deref().unwrap_or(""),
        round_to_bucket(x),
        round_to_bucket(y),
    )
}

/// Rounds a coordinate to the nearest 5px bucket so near-identical repeated
/// events (e.g. a jittery double click) collapse to one dedup key.
fn round_to_bucket(value: f64) -> i64 {
    ((value / 5.0).round() * 5.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::bundle::FrameLocator;
    use crate::strategy::{Rect, ScrollPosition};

    fn node(tag: &str, visible: bool, cursor_pointer: bool) -> NodeDescriptor {
        NodeDescriptor {
            handle: super::super::event::TargetHandle("h".into()),
            tag_name: tag.into(),
            id: None,
            classes: vec![],
            attributes: HashMap::new(),
            text_content: String::new(),
            bounding_rect: Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            computed_visible: visible,
            cursor_pointer,
            tabindex: None,
            content_editable: false,
            has_onclick: false,
            is_svg: false,
            sibling_index: 1,
        }
    }

    fn click_event(target: NodeDescriptor, timestamp_ms: u64) -> RawEvent {
        RawEvent {
            kind: EventKind::Click,
            is_trusted: true,
            point: Some((10.0, 10.0)),
            target_chain: vec![target],
            key: None,
            value: None,
            timestamp_ms,
            scroll_position: ScrollPosition { x: 0.0, y: 0.0 },
            frame: FrameLocator::top_level(),
            page_url: "/checkout".into(),
        }
    }

    #[test]
    fn untrusted_events_are_rejected() {
        let filter = EventFilter::new(250);
        let mut event = click_event(node("div", true, true), 0);
        event.is_trusted = false;
        assert!(!filter.accept(&event));
    }

    #[test]
    fn invisible_targets_are_rejected() {
        let filter = EventFilter::new(250);
        let event = click_event(node("button", false, false), 0);
        assert!(!filter.accept(&event));
    }

    #[test]
    fn non_interactive_click_without_cursor_pointer_is_rejected() {
        let filter = EventFilter::new(250);
        let event = click_event(node("div", true, false), 0);
        assert!(!filter.accept(&event));
    }

    #[test]
    fn non_interactive_click_with_cursor_pointer_is_accepted() {
        let filter = EventFilter::new(250);
        let event = click_event(node("div", true, true), 0);
        assert!(filter.accept(&event));
    }

    #[test]
    fn aria_hidden_targets_are_blocked() {
        let filter = EventFilter::new(250);
        let mut target = node("button", true, true);
        target.attributes.insert("aria-hidden".into(), "true".into());
        assert!(!filter.accept(&click_event(target, 0)));
    }

    #[test]
    fn duplicate_within_debounce_window_is_rejected() {
        let filter = EventFilter::new(250);
        assert!(filter.accept(&click_event(node("button", true, true), 0)));
        assert!(!filter.accept(&click_event(node("button", true, true), 100)));
    }

    #[test]
    fn duplicate_past_debounce_window_is_accepted() {
        let filter = EventFilter::new(250);
        assert!(filter.accept(&click_event(node("button", true, true), 0)));
        assert!(filter.accept(&click_event(node("button", true, true), 300)));
    }

    #[test]
    fn click_inside_terminal_container_is_accepted_without_cursor_pointer() {
        let filter = EventFilter::new(250);
        let mut container = node("div", true, false);
        container.attributes.insert("data-terminal".into(), "true".into());
        let target = node("span", true, false);
        let event = RawEvent {
            target_chain: vec![target, container],
            ..click_event(node("span", true, false), 0)
        };
        assert!(filter.accept(&event));
    }
}
