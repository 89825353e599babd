//! Visual/OCR evidence collector (spec §4.1 `VisionCapture`).

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::ports::VisionPort;
use crate::record::event::EventContext;
use crate::strategy::Rect;

use super::CaptureLayer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionSnapshot {
    pub text: String,
    pub bbox: Rect,
    /// OCR confidence on a 0-100 scale, as returned by the vision port.
    pub confidence: u8,
}

/// Requests a screenshot and, optionally, OCR on a region centered on the
/// event point (spec §4.1).
pub struct VisionCapture {
    running: bool,
    region_size: u32,
    port: Arc<dyn VisionPort>,
    /// Cached last snapshot, since `snapshot()` must be synchronous; the
    /// session refreshes this cache ahead of the event-accept path via
    /// `refresh`.
    last: Mutex<Option<VisionSnapshot>>,
}

impl VisionCapture {
    pub fn new(port: Arc<dyn VisionPort>, region_size: u32) -> Self {
        Self {
            running: false,
            region_size,
            port,
            last: Mutex::new(None),
        }
    }

    /// Performs the async screenshot + OCR round trip and caches the result
    /// so the next synchronous `snapshot()` call can return it. Failure
    /// degrades this layer's evidence to `None` without propagating.
    pub async fn refresh(&self, tab_id: &str, point: (f64, f64)) {
        let region = (
            point.0 - self.region_size as f64 / 2.0,
            point.1 - self.region_size as f64 / 2.0,
            self.region_size as f64,
            self.region_size as f64,
        );
        let result = async {
            let image = self.port.capture_screenshot(tab_id).await.ok()?;
            let ocr = self.port.recognize(&image, Some(region)).await.ok()?;
            Some(VisionSnapshot {
                text: ocr.text,
                bbox: ocr.bbox,
                confidence: ocr.confidence,
            })
        }
        .await;

        if let Ok(mut guard) = self.last.lock() {
            *guard = result;
        }
    }
}

impl CaptureLayer for VisionCapture {
    type Snapshot = VisionSnapshot;

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        if let Ok(mut guard) = self.last.lock() {
            *guard = None;
        }
    }

    fn snapshot(&self, _ctx: &EventContext) -> Option<VisionSnapshot> {
        if !self.running {
            return None;
        }
        self.last.lock().ok().and_then(|g| g.clone())
    }
}
