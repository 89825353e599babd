//! Assembles an `Action` from an accepted event's context, a capture-built
//! `LocatorBundle`, and the capture layers' evidence (spec §4.2
//! `ActionEmitter`, §4.4 chain production).

use std::sync::Arc;

use crate::action::{Action, ActionKind, LocatorBundle, StepNumber};
use crate::capture::{Evidence, VisionSnapshot};
use crate::chain::{produce_candidates, StrategyChainBuilder, StrategyScorer};
use crate::config::ScoringThresholds;
use crate::error::Result;
use crate::ports::CdpPort;

use super::event::{EventContext, EventKind};

/// Derives the recorded `ActionKind` (and, for `keydown`, whether it's a
/// dedicated `Enter` step) from the originating DOM event kind and key.
pub fn action_kind_for(kind: EventKind, key: Option<&str>) -> ActionKind {
    match kind {
        EventKind::Click => ActionKind::Click,
        EventKind::Input => ActionKind::Input,
        EventKind::Keydown => {
            if key == Some("Enter") {
                ActionKind::Enter
            } else {
                ActionKind::Keypress
            }
        }
    }
}

/// Builds `Action`s from accepted events: produces and scores fallback-chain
/// candidates against the live DOM and assigns the next step number. Does
/// not itself run the capture layers — the owning session supplies their
/// output, since it alone knows when each layer degraded to `None`.
pub struct ActionEmitter {
    cdp: Arc<dyn CdpPort>,
    tab_id: String,
    thresholds: ScoringThresholds,
    max_selector_depth: u32,
}

impl ActionEmitter {
    pub fn new(cdp: Arc<dyn CdpPort>, tab_id: impl Into<String>, max_selector_depth: u32) -> Self {
        Self {
            cdp,
            tab_id: tab_id.into(),
            thresholds: ScoringThresholds::default(),
            max_selector_depth,
        }
    }

    /// Builds the next `Action` for `ctx`. `next_step` is the step number the
    /// owning `Recording` expects next (spec §3 contiguity invariant).
    #[allow(clippy::too_many_arguments)]
    pub async fn emit(
        &self,
        ctx: &EventContext,
        kind: EventKind,
        key: Option<&str>,
        value: Option<String>,
        bundle: Option<LocatorBundle>,
        evidence: Evidence,
        vision: Option<&VisionSnapshot>,
        next_step: StepNumber,
    ) -> Result<Action> {
        let action_kind = action_kind_for(kind, key);

        let fallback_chain = match &bundle {
            Some(bundle) => {
                let candidates = produce_candidates(ctx, bundle, vision, self.max_selector_depth, &self.thresholds);
                let scored = StrategyScorer::score(candidates, self.cdp.as_ref(), &self.tab_id).await;
                Some(StrategyChainBuilder::build(scored)?)
            }
            None => None,
        };

        let action = Action {
            step_number: next_step,
            timestamp_ms: ctx.timestamp_ms,
            kind: action_kind,
            value,
            locator_bundle: bundle,
            evidence,
            fallback_chain,
        };
        action.validate()?;
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_with_enter_key_maps_to_enter_kind() {
        assert_eq!(action_kind_for(EventKind::Keydown, Some("Enter")), ActionKind::Enter);
    }

    #[test]
    fn non_enter_keydown_maps_to_keypress() {
        assert_eq!(action_kind_for(EventKind::Keydown, Some("Tab")), ActionKind::Keypress);
    }

    #[test]
    fn click_event_maps_to_click_kind() {
        assert_eq!(action_kind_for(EventKind::Click, None), ActionKind::Click);
    }

    #[test]
    fn open_action_kind_is_never_derived_from_a_dom_event() {
        // `open` actions are synthesized by the session at recording start,
        // never derived from a click/input/keydown event.
        for kind in [EventKind::Click, EventKind::Input, EventKind::Keydown] {
            assert_ne!(action_kind_for(kind, None), ActionKind::Open);
        }
    }
}
