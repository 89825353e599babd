//! Walks a raw event's target chain to the element the user's action should
//! actually be attributed to (spec §4.2 `TargetResolver`).

use super::event::NodeDescriptor;

/// Select2 (and similar JS widget libraries) render a styled `<span>`
/// wrapper in front of a hidden native `<select>`; the wrapper is what the
/// user actually clicked and carries the interaction semantics, so it wins
/// over walking further up to a plain container.
fn is_select2_wrapper(node: &NodeDescriptor) -> bool {
    node.classes.iter().any(|c| c == "select2-selection" || c == "select2-container")
}

/// Resolves `chain` (target first, document root last) to the index of the
/// node the emitted action should target: the nearest ancestor (inclusive)
/// that is itself interactive, preferring a labeled ancestor over an
/// unlabeled one when both are equally near, and recognizing the
/// Select2-wrapper and icon-leaf special cases (spec §4.2).
pub struct TargetResolver;

impl TargetResolver {
    pub fn resolve(chain: &[NodeDescriptor]) -> usize {
        if chain.is_empty() {
            return 0;
        }

        if let Some(idx) = chain.iter().position(is_select2_wrapper) {
            return idx;
        }

        let mut first_interactive: Option<usize> = None;
        let mut first_labeled_interactive: Option<usize> = None;

        for (i, node) in chain.iter().enumerate() {
            if !node.is_interactive() {
                continue;
            }
            if first_interactive.is_none() {
                first_interactive = Some(i);
            }
            if has_label(node) {
                first_labeled_interactive = Some(i);
                break;
            }
        }

        first_labeled_interactive.or(first_interactive).unwrap_or(0)
    }
}

fn has_label(node: &NodeDescriptor) -> bool {
    node.attr("aria-label").is_some()
        || node.attr("title").is_some()
        || !node.text_content.trim().is_empty()
}
