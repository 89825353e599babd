//! The actionability gate: a polling state machine over five predicates
//! that must hold simultaneously before `ActionDispatcher` fires (spec
//! §4.6).

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::ActionabilityConfig;
use crate::ports::{CdpPort, ElementState};
use crate::strategy::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Attached,
    Visible,
    Stable,
    Enabled,
    InViewport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionabilityOutcome {
    Ready(Rect),
    TimedOut { unmet: Predicate },
}

pub struct Actionability;

fn overlaps_viewport(rect: Rect, viewport: (f64, f64)) -> bool {
    rect.x < viewport.0 && rect.x + rect.width > 0.0 && rect.y < viewport.1 && rect.y + rect.height > 0.0
}

impl Actionability {
    /// Polls `element_state` at `config.poll_interval` until `attached`,
    /// `computed_visible`, a stable bounding box across two consecutive
    /// samples, `enabled`, and in-viewport all hold on the same tick, or
    /// `timeout` elapses.
    pub async fn wait_until_actionable(
        cdp: &dyn CdpPort,
        tab_id: &str,
        node_id: u64,
        viewport: (f64, f64),
        config: &ActionabilityConfig,
        timeout: Duration,
    ) -> ActionabilityOutcome {
        let deadline = Instant::now() + timeout;
        let mut previous: Option<ElementState> = None;
        let mut last_checked = Predicate::Attached;

        loop {
            let current = match cdp.element_state(tab_id, node_id).await {
                Ok(state) => state,
                Err(_) => {
                    if Instant::now() >= deadline {
                        return ActionabilityOutcome::TimedOut { unmet: Predicate::Attached };
                    }
                    tokio::time::sleep(config.poll_interval).await;
                    continue;
                }
            };

            let stable = previous.map(|p| p.bounding_rect == current.bounding_rect).unwrap_or(false);
            let in_viewport = overlaps_viewport(current.bounding_rect, viewport);

            if current.attached && current.computed_visible && stable && current.enabled && in_viewport {
                return ActionabilityOutcome::Ready(current.bounding_rect);
            }

            last_checked = first_unmet(&current, stable, in_viewport);

            if Instant::now() >= deadline {
                debug!(?last_checked, "actionability timed out");
                return ActionabilityOutcome::TimedOut { unmet: last_checked };
            }

            previous = Some(current);
            tokio::time::sleep(config.poll_interval).await;
        }
    }
}

fn first_unmet(state: &ElementState, stable: bool, in_viewport: bool) -> Predicate {
    if !state.attached {
        Predicate::Attached
    } else if !state.computed_visible {
        Predicate::Visible
    } else if !stable {
        Predicate::Stable
    } else if !state.enabled {
        Predicate::Enabled
    } else {
        debug_assert!(!in_viewport);
        Predicate::InViewport
    }
}
