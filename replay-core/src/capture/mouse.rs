//! Mouse trajectory evidence collector (spec §4.1 `MouseCapture`).

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::evidence::mouse_trail::{MouseTrail, MouseTrailPoint};
use crate::record::event::EventContext;

use super::CaptureLayer;

/// Geometric classification of a mouse trajectory leading up to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryPattern {
    Direct,
    Curved,
    Searching,
    Hesitant,
    Corrective,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouseSnapshot {
    pub trail: Vec<MouseTrailPoint>,
    pub endpoint: (f64, f64),
    pub duration_ms: u64,
    pub direction: (f64, f64),
    pub total_distance: f64,
    pub average_velocity: f64,
    pub pattern: TrajectoryPattern,
}

/// Classifies a trail by path-length/endpoint-distance ratio and reversal
/// count (spec §4.1).
fn classify(trail: &MouseTrail) -> TrajectoryPattern {
    let points = trail.snapshot();
    if points.len() < 2 {
        return TrajectoryPattern::Direct;
    }

    let first = points.first().unwrap();
    let last = points.last().unwrap();
    let endpoint_distance =
        ((last.x - first.x).powi(2) + (last.y - first.y).powi(2)).sqrt().max(1.0);
    let path_length = trail.total_distance();
    let ratio = path_length / endpoint_distance;
    let reversals = trail.direction_reversals();

    if reversals >= 4 {
        TrajectoryPattern::Corrective
    } else if ratio > 3.0 {
        TrajectoryPattern::Searching
    } else if ratio > 1.6 {
        TrajectoryPattern::Curved
    } else if reversals >= 1 {
        TrajectoryPattern::Hesitant
    } else {
        TrajectoryPattern::Direct
    }
}

pub struct MouseCapture {
    running: bool,
    trail: Mutex<MouseTrail>,
}

impl MouseCapture {
    pub fn new(ttl: Duration) -> Self {
        Self {
            running: false,
            trail: Mutex::new(MouseTrail::new(ttl)),
        }
    }

    /// Records one sampled mouse position. Called by the host bridge at up
    /// to the configured sampling rate (spec: `<= 20 Hz`).
    pub fn record_sample(&self, x: f64, y: f64, timestamp_ms: u64) {
        if !self.running {
            return;
        }
        if let Ok(mut trail) = self.trail.lock() {
            trail.push(MouseTrailPoint { x, y, timestamp_ms });
        }
    }
}

impl CaptureLayer for MouseCapture {
    type Snapshot = MouseSnapshot;

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        if let Ok(mut trail) = self.trail.lock() {
            *trail = MouseTrail::new(Duration::from_secs(5));
        }
    }

    fn snapshot(&self, ctx: &EventContext) -> Option<MouseSnapshot> {
        if !self.running {
            return None;
        }
        let trail = self.trail.lock().ok()?;
        if trail.is_empty() {
            return None;
        }

        let points = trail.snapshot();
        let first_ts = points.first().map(|p| p.timestamp_ms).unwrap_or(ctx.timestamp_ms);
        let last_ts = points.last().map(|p| p.timestamp_ms).unwrap_or(ctx.timestamp_ms);
        let duration_ms = last_ts.saturating_sub(first_ts);
        let total_distance = trail.total_distance();
        let average_velocity = if duration_ms > 0 {
            total_distance / (duration_ms as f64 / 1000.0)
        } else {
            0.0
        };

        Some(MouseSnapshot {
            endpoint: trail.last().map(|p| (p.x, p.y)).unwrap_or(ctx.point),
            duration_ms,
            direction: trail.recent_direction(),
            total_distance,
            average_velocity,
            pattern: classify(&trail),
            trail: points,
        })
    }
}
