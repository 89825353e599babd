//! Translates a resolved target and an `Action` into one `ACTION_DISPATCH`
//! call, branching on whether the resolution carries a DOM node handle.

use crate::action::{Action, ActionKind};
use crate::error::{Error, Result};
use crate::evaluator::ResolvedTarget;
use crate::ports::{DispatchKind, InputSynthesisPort};
use crate::strategy::Rect;

pub struct ActionDispatcher<'a> {
    input: &'a dyn InputSynthesisPort,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(input: &'a dyn InputSynthesisPort) -> Self {
        Self { input }
    }

    /// Dispatches against a live node when `target.node_id` is present;
    /// otherwise synthesizes input at the center of the resolved bounding
    /// rect, the only option a vision or raw-coordinates hit offers.
    pub async fn dispatch(&self, tab_id: &str, action: &Action, target: &ResolvedTarget) -> Result<()> {
        let kind = dispatch_kind_for(action.kind)?;
        let value = action.value.as_deref();

        match target.node_id {
            Some(node_id) => self.input.dispatch(tab_id, node_id, kind, value).await,
            None => self.input.dispatch_at_point(tab_id, center_of(target.bounding_rect), kind, value).await,
        }
    }
}

fn dispatch_kind_for(kind: ActionKind) -> Result<DispatchKind> {
    match kind {
        ActionKind::Click => Ok(DispatchKind::Click),
        ActionKind::Input => Ok(DispatchKind::Type),
        ActionKind::Enter => Ok(DispatchKind::Enter),
        ActionKind::Keypress => Ok(DispatchKind::Keypress),
        ActionKind::Open => Err(Error::Validation("open actions have no dispatch target".into())),
    }
}

fn center_of(rect: Rect) -> (f64, f64) {
    (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::action::StepNumber;
    use crate::capture::Evidence;

    #[derive(Debug, PartialEq)]
    enum Call {
        Node(u64, DispatchKind, Option<String>),
        Point((f64, f64), DispatchKind, Option<String>),
    }

    struct RecordingInput {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingInput {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl InputSynthesisPort for RecordingInput {
        async fn dispatch(&self, _tab_id: &str, node_id: u64, kind: DispatchKind, value: Option<&str>) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Node(node_id, kind, value.map(String::from)));
            Ok(())
        }

        async fn dispatch_at_point(&self, _tab_id: &str, point: (f64, f64), kind: DispatchKind, value: Option<&str>) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Point(point, kind, value.map(String::from)));
            Ok(())
        }
    }

    fn action(kind: ActionKind, value: Option<&str>) -> Action {
        Action {
            step_number: StepNumber(1),
            timestamp_ms: 0,
            kind,
            value: value.map(String::from),
            locator_bundle: None,
            evidence: Evidence::default(),
            fallback_chain: None,
        }
    }

    #[tokio::test]
    async fn click_with_node_id_dispatches_against_the_node() {
        let input = RecordingInput::new();
        let dispatcher = ActionDispatcher::new(&input);
        let target = ResolvedTarget { node_id: Some(42), bounding_rect: Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 } };
        dispatcher.dispatch("tab-1", &action(ActionKind::Click, None), &target).await.unwrap();
        assert_eq!(input.calls.lock().unwrap().as_slice(), &[Call::Node(42, DispatchKind::Click, None)]);
    }

    #[tokio::test]
    async fn vision_resolution_dispatches_at_rect_center() {
        let input = RecordingInput::new();
        let dispatcher = ActionDispatcher::new(&input);
        let target = ResolvedTarget { node_id: None, bounding_rect: Rect { x: 10.0, y: 20.0, width: 40.0, height: 20.0 } };
        dispatcher.dispatch("tab-1", &action(ActionKind::Click, None), &target).await.unwrap();
        assert_eq!(input.calls.lock().unwrap().as_slice(), &[Call::Point((30.0, 30.0), DispatchKind::Click, None)]);
    }

    #[tokio::test]
    async fn input_action_carries_its_value() {
        let input = RecordingInput::new();
        let dispatcher = ActionDispatcher::new(&input);
        let target = ResolvedTarget { node_id: Some(7), bounding_rect: Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 } };
        dispatcher.dispatch("tab-1", &action(ActionKind::Input, Some("hello")), &target).await.unwrap();
        assert_eq!(
            input.calls.lock().unwrap().as_slice(),
            &[Call::Node(7, DispatchKind::Type, Some("hello".to_string()))]
        );
    }

    #[tokio::test]
    async fn open_action_is_rejected() {
        let input = RecordingInput::new();
        let dispatcher = ActionDispatcher::new(&input);
        let target = ResolvedTarget { node_id: Some(1), bounding_rect: Rect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 } };
        assert!(dispatcher.dispatch("tab-1", &action(ActionKind::Open, None), &target).await.is_err());
    }
}
