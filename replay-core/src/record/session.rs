//! Orchestrates one recording: wires the four capture layers, the
//! `EventFilter`, `TargetResolver`, and `ActionEmitter` into the pipeline
//! that turns accepted raw events into `Action`s on a `Recording` (spec
//! §4.1-§4.2).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::action::{Action, Recording, StepNumber};
use crate::capture::{CaptureLayer, DomCapture, MouseCapture, NetworkCapture, VisionCapture};
use crate::config::RecorderConfig;
use crate::error::Result;
use crate::evidence::sequence_pattern::SequencePatternAnalyzer;
use crate::ports::{CdpPort, NetworkInterceptorPort, VisionPort};
use crate::repository::RecordingRepository;

use super::emitter::ActionEmitter;
use super::event::{EventContext, EventKind, RawEvent};
use super::event_filter::EventFilter;
use super::target_resolver::TargetResolver;

/// A single live recording: owns every capture layer, filters and resolves
/// incoming raw events, and persists the growing `Recording` through its
/// repository after each accepted step.
pub struct RecordingSession {
    tab_id: String,
    recording: Mutex<Recording>,
    filter: EventFilter,
    emitter: ActionEmitter,
    dom: DomCapture,
    mouse: MouseCapture,
    network: NetworkCapture,
    vision: VisionCapture,
    network_interceptor: Arc<dyn NetworkInterceptorPort>,
    vision_port: Arc<dyn VisionPort>,
    sequence_analyzer: SequencePatternAnalyzer,
    prior_labels: Mutex<Vec<String>>,
    repository: Arc<dyn RecordingRepository>,
    running: AtomicBool,
}

impl RecordingSession {
    pub fn new(
        recording: Recording,
        tab_id: impl Into<String>,
        cdp: Arc<dyn CdpPort>,
        vision_port: Arc<dyn VisionPort>,
        network_interceptor: Arc<dyn NetworkInterceptorPort>,
        repository: Arc<dyn RecordingRepository>,
        config: RecorderConfig,
    ) -> Self {
        let tab_id = tab_id.into();
        Self {
            emitter: ActionEmitter::new(cdp, tab_id.clone(), config.max_selector_depth),
            dom: DomCapture::new(config.max_selector_depth),
            mouse: MouseCapture::new(config.mouse_trail_ttl),
            network: NetworkCapture::new(config.network_ring_size),
            vision: VisionCapture::new(vision_port.clone(), config.ocr_region_size),
            filter: EventFilter::new(config.debounce_ms),
            vision_port,
            network_interceptor,
            sequence_analyzer: SequencePatternAnalyzer::new(),
            prior_labels: Mutex::new(Vec::new()),
            recording: Mutex::new(recording),
            repository,
            tab_id,
            running: AtomicBool::new(false),
        }
    }

    /// Starts every capture layer and network interception. Idempotent.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.dom.start();
        self.mouse.start();
        self.network.start();
        self.vision.start();
        self.network_interceptor.start_intercepting(&self.tab_id).await?;
        info!(tab_id = %self.tab_id, "recording session started");
        Ok(())
    }

    /// Stops every capture layer and network interception. Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.dom.stop();
        self.mouse.stop();
        self.network.stop();
        self.vision.stop();
        self.network_interceptor.stop_intercepting(&self.tab_id).await?;
        info!(tab_id = %self.tab_id, "recording session stopped");
        Ok(())
    }

    /// Host bridge hook for mouse position samples, forwarded directly to
    /// the mouse capture layer (spec §4.1, `<= 20 Hz` sampling).
    pub fn record_mouse_sample(&self, x: f64, y: f64, timestamp_ms: u64) {
        self.mouse.record_sample(x, y, timestamp_ms);
    }

    /// Host bridge hooks for network activity, forwarded to the network
    /// capture layer's ring buffer.
    pub fn record_request_start(&self, url: &str, method: &str, start_ms: u64) {
        self.network.on_request_start(url, method, start_ms);
    }

    pub fn record_request_end(&self, url: &str, status: u16, end_ms: u64) {
        self.network.on_request_end(url, status, end_ms);
    }

    /// Refreshes the vision layer's cached screenshot/OCR ahead of an
    /// expected interaction at `point`. Best-effort: failures degrade the
    /// next `Evidence.vision` to `None` (spec §4.1).
    pub async fn refresh_vision(&self, point: (f64, f64)) {
        self.vision.refresh(&self.tab_id, point).await;
    }

    /// Processes one raw event: filters, resolves the target, builds the
    /// `Action`, and persists the updated recording. Returns `Ok(None)` when
    /// the event was filtered out, not an error.
    pub async fn handle_event(&self, event: RawEvent) -> Result<Option<Action>> {
        if !self.filter.accept(&event) {
            debug!(kind = ?event.kind, "event rejected by filter");
            return Ok(None);
        }

        let resolved_index = TargetResolver::resolve(&event.target_chain);
        let target_chain = event.target_chain[resolved_index..].to_vec();

        let prior_labels = self.prior_labels.lock().await.clone();
        let ctx = EventContext {
            point: event.point.unwrap_or((0.0, 0.0)),
            scroll_position: event.scroll_position,
            target_chain,
            frame: event.frame.clone(),
            timestamp_ms: event.timestamp_ms,
            prior_labels,
            page_url: event.page_url.clone(),
        };

        let evidence = crate::capture::Evidence {
            dom: self.dom.snapshot(&ctx),
            vision: self.vision.snapshot(&ctx),
            mouse: self.mouse.snapshot(&ctx),
            network: self.network.snapshot(&ctx),
        };
        let bundle = self.dom.build_bundle(&ctx);
        let vision_snapshot = evidence.vision.clone();

        let mut recording = self.recording.lock().await;
        let next_step = StepNumber(recording.actions.len() as u32 + 1);

        let action = self
            .emitter
            .emit(&ctx, event.kind, event.key.as_deref(), event.value.clone(), bundle, evidence, vision_snapshot.as_ref(), next_step)
            .await?;

        recording.push_action(action.clone())?;

        let label = step_label(&action);
        {
            let mut labels = self.prior_labels.lock().await;
            labels.push(label);
            self.sequence_analyzer.observe(&event.page_url, &labels);
        }

        if let Err(err) = self.repository.save(recording.clone()).await {
            warn!(?err, "failed to persist recording after step");
        }

        Ok(Some(action))
    }

    pub async fn snapshot(&self) -> Recording {
        self.recording.lock().await.clone()
    }
}

/// A stable label for sequence-pattern learning: the primary strategy's
/// identity when a fallback chain exists, else the action kind alone.
fn step_label(action: &Action) -> String {
    match &action.fallback_chain {
        Some(chain) => format!("{:?}:{}", action.kind, chain.primary().identity_key()),
        None => format!("{:?}", action.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::action::bundle::FrameLocator;
    use crate::ports::{CdpNode, ElementState, EvidenceCandidateNode, OcrResult};
    use crate::record::event::{NodeDescriptor, TargetHandle};
    use crate::repository::InMemoryRecordingRepository;
    use crate::strategy::{Rect, ScrollPosition};

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
            Ok(vec![1])
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

    struct StubInterceptor;
    #[async_trait]
    impl NetworkInterceptorPort for StubInterceptor {
        async fn start_intercepting(&self, _tab_id: &str) -> Result<()> {
            Ok(())
        }
        async fn stop_intercepting(&self, _tab_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn button_target() -> NodeDescriptor {
        NodeDescriptor {
            handle: TargetHandle("btn-1".into()),
            tag_name: "button".into(),
            id: Some("submit".into()),
            classes: vec!["btn".into()],
            attributes: HashMap::new(),
            text_content: "Submit".into(),
            bounding_rect: Rect { x: 10.0, y: 10.0, width: 40.0, height: 20.0 },
            computed_visible: true,
            cursor_pointer: true,
            tabindex: None,
            content_editable: false,
            has_onclick: false,
            is_svg: false,
            sibling_index: 1,
        }
    }

    fn session() -> RecordingSession {
        RecordingSession::new(
            Recording::new("rec-1", "test", "proj-1", 3),
            "tab-1",
            Arc::new(StubCdp),
            Arc::new(StubVision),
            Arc::new(StubInterceptor),
            Arc::new(InMemoryRecordingRepository::new()),
            RecorderConfig::default(),
        )
    }

    fn click_event(timestamp_ms: u64) -> RawEvent {
        RawEvent {
            kind: EventKind::Click,
            is_trusted: true,
            point: Some((30.0, 20.0)),
            target_chain: vec![button_target()],
            key: None,
            value: None,
            timestamp_ms,
            scroll_position: ScrollPosition { x: 0.0, y: 0.0 },
            frame: FrameLocator::top_level(),
            page_url: "/checkout".into(),
        }
    }

    #[tokio::test]
    async fn accepted_event_produces_a_recorded_action() {
        let mut session = session();
        session.start().await.unwrap();
        let action = session.handle_event(click_event(0)).await.unwrap();
        assert!(action.is_some());
        let recording = session.snapshot().await;
        assert_eq!(recording.actions.len(), 1);
        assert_eq!(recording.actions[0].step_number.0, 1);
    }

    #[tokio::test]
    async fn second_accepted_action_gets_a_contiguous_step_number() {
        let mut session = session();
        session.start().await.unwrap();
        session.handle_event(click_event(0)).await.unwrap();
        session.handle_event(click_event(1000)).await.unwrap();
        let recording = session.snapshot().await;
        assert_eq!(recording.actions.len(), 2);
        assert_eq!(recording.actions[1].step_number.0, 2);
    }

    #[tokio::test]
    async fn filtered_event_produces_no_action() {
        let mut session = session();
        session.start().await.unwrap();
        let mut event = click_event(0);
        event.is_trusted = false;
        let action = session.handle_event(event).await.unwrap();
        assert!(action.is_none());
        assert_eq!(session.snapshot().await.actions.len(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut session = session();
        session.start().await.unwrap();
        session.stop().await.unwrap();
        session.stop().await.unwrap();
    }
}
