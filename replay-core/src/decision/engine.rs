//! Walks one `Action`'s fallback chain against the live page: resolve,
//! gate on actionability, dispatch, and log a `TelemetryEvent` per attempt
//! regardless of outcome.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::actionability::{Actionability, ActionabilityOutcome};
use crate::config::{ActionabilityConfig, EvaluatorTimeouts};
use crate::dispatch::ActionDispatcher;
use crate::error::ErrorKind;
use crate::evaluator::{EvaluationContext, StrategyEvaluator};
use crate::strategy::StrategyKind;
use crate::telemetry::{TelemetryEvent, TelemetryStore};

use super::run::StepOutcome;

fn evaluator_timeout(timeouts: &EvaluatorTimeouts, kind: StrategyKind) -> Duration {
    match kind {
        StrategyKind::CdpSemantic => timeouts.cdp_semantic,
        StrategyKind::CdpPower => timeouts.cdp_power,
        StrategyKind::DomSelector | StrategyKind::CssSelector => timeouts.dom_selector,
        StrategyKind::EvidenceScoring => timeouts.evidence_scoring,
        StrategyKind::VisionOcr => timeouts.vision_ocr,
        StrategyKind::Coordinates => timeouts.coordinates,
    }
}

pub struct DecisionEngine<'a> {
    evaluators: Vec<Box<dyn StrategyEvaluator>>,
    dispatcher: ActionDispatcher<'a>,
    telemetry: &'a dyn TelemetryStore,
    evaluator_timeouts: EvaluatorTimeouts,
    actionability: ActionabilityConfig,
    disabled_kinds: &'a [StrategyKind],
}

impl<'a> DecisionEngine<'a> {
    pub fn new(
        evaluators: Vec<Box<dyn StrategyEvaluator>>,
        dispatcher: ActionDispatcher<'a>,
        telemetry: &'a dyn TelemetryStore,
        evaluator_timeouts: EvaluatorTimeouts,
        actionability: ActionabilityConfig,
        disabled_kinds: &'a [StrategyKind],
    ) -> Self {
        Self {
            evaluators,
            dispatcher,
            telemetry,
            evaluator_timeouts,
            actionability,
            disabled_kinds,
        }
    }

    fn evaluator_for(&self, kind: StrategyKind) -> Option<&dyn StrategyEvaluator> {
        self.evaluators.iter().find(|e| e.handled_kinds().contains(&kind)).map(|b| b.as_ref())
    }

    fn record(&self, event: TelemetryEvent) {
        if let Err(err) = self.telemetry.append(&event) {
            warn!(?err, "failed to persist telemetry event");
        }
    }

    /// Walks `action.fallback_chain` in confidence order, returning the
    /// first success or an aggregate failure outcome once the chain is
    /// exhausted or `step_deadline` elapses.
    pub async fn execute_step(
        &self,
        run_id: &str,
        tab_id: &str,
        action: &Action,
        base_ctx: &EvaluationContext<'_>,
        step_deadline: Duration,
        viewport: (f64, f64),
    ) -> StepOutcome {
        let Some(chain) = &action.fallback_chain else {
            return StepOutcome::AllStrategiesFailed;
        };

        let step_deadline_instant = Instant::now() + step_deadline;

        for (attempt_index, strategy) in chain.iter().enumerate() {
            if self.disabled_kinds.contains(&strategy.kind) {
                debug!(kind = ?strategy.kind, "skipping disabled strategy kind");
                continue;
            }

            if Instant::now() >= step_deadline_instant {
                info!(step = action.step_number.0, "step deadline elapsed before chain exhausted");
                return StepOutcome::TimedOut;
            }

            let Some(evaluator) = self.evaluator_for(strategy.kind) else {
                warn!(kind = ?strategy.kind, "no evaluator registered for strategy kind");
                continue;
            };

            let per_strategy_timeout = evaluator_timeout(&self.evaluator_timeouts, strategy.kind);
            let attempt_deadline = step_deadline_instant.min(Instant::now() + per_strategy_timeout);
            let ctx = base_ctx.with_deadline(attempt_deadline);

            let started = Instant::now();
            let eval = evaluator.evaluate(strategy, &ctx).await;
            let eval_duration = started.elapsed();

            if !eval.found {
                self.record(TelemetryEvent::new(
                    run_id,
                    action.step_number.0,
                    strategy.kind,
                    attempt_index,
                    false,
                    eval.confidence,
                    eval_duration.as_millis() as u64,
                    eval.error_kind,
                ));
                continue;
            }

            let resolved = eval.resolved.expect("found result always carries a resolved target");

            let actionability_outcome = match resolved.node_id {
                Some(node_id) => {
                    Actionability::wait_until_actionable(ctx.cdp, tab_id, node_id, viewport, &self.actionability, per_strategy_timeout).await
                }
                None => ActionabilityOutcome::Ready(resolved.bounding_rect),
            };

            let ActionabilityOutcome::Ready(_) = actionability_outcome else {
                let ActionabilityOutcome::TimedOut { unmet } = actionability_outcome else {
                    unreachable!()
                };
                debug!(kind = ?strategy.kind, ?unmet, "actionability timed out");
                self.record(TelemetryEvent::new(
                    run_id,
                    action.step_number.0,
                    strategy.kind,
                    attempt_index,
                    false,
                    eval.confidence,
                    started.elapsed().as_millis() as u64,
                    Some(ErrorKind::ExecutionTimeout),
                ));
                continue;
            };

            let dispatch_result = self.dispatcher.dispatch(tab_id, action, &resolved).await;
            let total_duration = started.elapsed();

            match dispatch_result {
                Ok(()) => {
                    self.record(TelemetryEvent::new(
                        run_id,
                        action.step_number.0,
                        strategy.kind,
                        attempt_index,
                        true,
                        eval.confidence,
                        total_duration.as_millis() as u64,
                        None,
                    ));
                    return StepOutcome::Succeeded { strategy_kind: strategy.kind, attempt_index };
                }
                Err(_) => {
                    self.record(TelemetryEvent::new(
                        run_id,
                        action.step_number.0,
                        strategy.kind,
                        attempt_index,
                        false,
                        eval.confidence,
                        total_duration.as_millis() as u64,
                        Some(ErrorKind::ElementNotFound),
                    ));
                }
            }
        }

        StepOutcome::AllStrategiesFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::action::{ActionKind, FallbackChain, StepNumber};
    use crate::capture::Evidence;
    use crate::error::Result;
    use crate::evaluator::{EvalResult, ResolvedTarget};
    use crate::evidence::mouse_trail::MouseTrailPoint;
    use crate::evidence::sequence_pattern::SequencePatternAnalyzer;
    use crate::ports::{CdpNode, CdpPort, DispatchKind, ElementState, EvidenceCandidateNode, InputSynthesisPort, OcrResult, VisionPort};
    use crate::strategy::{Rect, ScrollPosition, Strategy, StrategyMetadata};
    use crate::telemetry::SqliteTelemetryStore;
    use crate::evaluator::NoHistory;

    struct StubCdp;
    #[async_trait]
    impl CdpPort for StubCdp {
        async fn attach(&self, _tab_id: &str) -> Result<()> {
            Ok(())
        }
        async fn detach(&self, _tab_id: &str) -> Result<()> {
            Ok(())
        }
        async fn query_accessibility(&self, _tab_id: &str, _role: Option<&str>, _name: &str, _exact: bool) -> Result<Vec<CdpNode>> {
            Ok(vec![])
        }
        async fn query_selector_all(&self, _tab_id: &str, _selector: &str) -> Result<Vec<u64>> {
            Ok(vec![])
        }
        async fn element_state(&self, _tab_id: &str, _node_id: u64) -> Result<ElementState> {
            Ok(ElementState {
                attached: true,
                computed_visible: true,
                enabled: true,
                bounding_rect: Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            })
        }
        async fn query_candidates_by_tag(&self, _tab_id: &str, _tag_name: &str) -> Result<Vec<EvidenceCandidateNode>> {
            Ok(vec![])
        }
        async fn current_scroll(&self, _tab_id: &str) -> Result<ScrollPosition> {
            Ok(ScrollPosition { x: 0.0, y: 0.0 })
        }
    }

    struct StubVision;
    #[async_trait]
    impl VisionPort for StubVision {
        async fn capture_screenshot(&self, _tab_id: &str) -> Result<Vec<u8>> {
            Ok(vec![])
        }
        async fn recognize(&self, _image: &[u8], _region: Option<(f64, f64, f64, f64)>) -> Result<OcrResult> {
            unreachable!("not exercised by these tests")
        }
    }

    struct StubInput;
    #[async_trait]
    impl InputSynthesisPort for StubInput {
        async fn dispatch(&self, _tab_id: &str, _node_id: u64, _kind: DispatchKind, _value: Option<&str>) -> Result<()> {
            Ok(())
        }
        async fn dispatch_at_point(&self, _tab_id: &str, _point: (f64, f64), _kind: DispatchKind, _value: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    /// Always resolves at full confidence, regardless of the handled kind.
    struct AlwaysFindsEvaluator(&'static [StrategyKind]);
    #[async_trait]
    impl StrategyEvaluator for AlwaysFindsEvaluator {
        fn handled_kinds(&self) -> &'static [StrategyKind] {
            self.0
        }
        async fn evaluate(&self, _strategy: &Strategy, _ctx: &EvaluationContext<'_>) -> EvalResult {
            EvalResult::found(0.9, ResolvedTarget { node_id: Some(1), bounding_rect: Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 } })
        }
    }

    struct NeverFindsEvaluator(&'static [StrategyKind]);
    #[async_trait]
    impl StrategyEvaluator for NeverFindsEvaluator {
        fn handled_kinds(&self) -> &'static [StrategyKind] {
            self.0
        }
        async fn evaluate(&self, _strategy: &Strategy, _ctx: &EvaluationContext<'_>) -> EvalResult {
            EvalResult::not_found(ErrorKind::ElementNotFound)
        }
    }

    fn chain_action(kinds: &[StrategyKind]) -> Action {
        let strategies = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let metadata = StrategyMetadata::Coordinates { x: 0.0, y: 0.0, relative_to: None };
                Strategy::new(kind, 0.9 - (i as f64 * 0.05), metadata)
            })
            .collect();
        Action {
            step_number: StepNumber(1),
            timestamp_ms: 0,
            kind: ActionKind::Click,
            value: None,
            locator_bundle: None,
            evidence: Evidence::default(),
            fallback_chain: Some(FallbackChain::new(strategies).unwrap()),
        }
    }

    fn base_ctx<'a>(cdp: &'a StubCdp, vision: &'a StubVision, trail: &'a [MouseTrailPoint], analyzer: &'a SequencePatternAnalyzer, labels: &'a [String], history: &'a NoHistory) -> EvaluationContext<'a> {
        EvaluationContext {
            tab_id: "tab-1",
            deadline: Instant::now() + Duration::from_secs(5),
            cdp,
            vision,
            current_scroll: ScrollPosition { x: 0.0, y: 0.0 },
            current_mouse_trail: trail,
            sequence_analyzer: analyzer,
            prior_labels: labels,
            page_url: "/checkout",
            history,
        }
    }

    #[tokio::test]
    async fn first_strategy_success_short_circuits_the_chain() {
        let cdp = StubCdp;
        let vision = StubVision;
        let input = StubInput;
        let telemetry = SqliteTelemetryStore::in_memory().unwrap();
        let trail = vec![];
        let analyzer = SequencePatternAnalyzer::new();
        let labels = vec![];
        let history = NoHistory;

        let evaluators: Vec<Box<dyn StrategyEvaluator>> = vec![Box::new(AlwaysFindsEvaluator(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]))];
        let dispatcher = ActionDispatcher::new(&input);
        let engine = DecisionEngine::new(evaluators, dispatcher, &telemetry, EvaluatorTimeouts::default(), ActionabilityConfig::default(), &[]);

        let action = chain_action(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]);
        let ctx = base_ctx(&cdp, &vision, &trail, &analyzer, &labels, &history);
        let outcome = engine.execute_step("run-1", "tab-1", &action, &ctx, Duration::from_secs(5), (1024.0, 768.0)).await;
        assert_eq!(outcome, StepOutcome::Succeeded { strategy_kind: StrategyKind::CdpSemantic, attempt_index: 0 });

        let events = telemetry.read_run("run-1").unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].succeeded);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_all_strategies_failed() {
        let cdp = StubCdp;
        let vision = StubVision;
        let input = StubInput;
        let telemetry = SqliteTelemetryStore::in_memory().unwrap();
        let trail = vec![];
        let analyzer = SequencePatternAnalyzer::new();
        let labels = vec![];
        let history = NoHistory;

        let evaluators: Vec<Box<dyn StrategyEvaluator>> = vec![Box::new(NeverFindsEvaluator(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]))];
        let dispatcher = ActionDispatcher::new(&input);
        let engine = DecisionEngine::new(evaluators, dispatcher, &telemetry, EvaluatorTimeouts::default(), ActionabilityConfig::default(), &[]);

        let action = chain_action(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]);
        let ctx = base_ctx(&cdp, &vision, &trail, &analyzer, &labels, &history);
        let outcome = engine.execute_step("run-2", "tab-1", &action, &ctx, Duration::from_secs(5), (1024.0, 768.0)).await;
        assert_eq!(outcome, StepOutcome::AllStrategiesFailed);

        let events = telemetry.read_run("run-2").unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.succeeded));
    }

    #[tokio::test]
    async fn disabled_kind_produces_no_telemetry_record() {
        let cdp = StubCdp;
        let vision = StubVision;
        let input = StubInput;
        let telemetry = SqliteTelemetryStore::in_memory().unwrap();
        let trail = vec![];
        let analyzer = SequencePatternAnalyzer::new();
        let labels = vec![];
        let history = NoHistory;

        let evaluators: Vec<Box<dyn StrategyEvaluator>> = vec![Box::new(AlwaysFindsEvaluator(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]))];
        let dispatcher = ActionDispatcher::new(&input);
        let disabled = [StrategyKind::CdpSemantic];
        let engine = DecisionEngine::new(evaluators, dispatcher, &telemetry, EvaluatorTimeouts::default(), ActionabilityConfig::default(), &disabled);

        let action = chain_action(&[StrategyKind::CdpSemantic, StrategyKind::Coordinates]);
        let ctx = base_ctx(&cdp, &vision, &trail, &analyzer, &labels, &history);
        let outcome = engine.execute_step("run-3", "tab-1", &action, &ctx, Duration::from_secs(5), (1024.0, 768.0)).await;
        assert_eq!(outcome, StepOutcome::Succeeded { strategy_kind: StrategyKind::Coordinates, attempt_index: 1 });

        let events = telemetry.read_run("run-3").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].strategy_kind, StrategyKind::Coordinates);
    }
}
