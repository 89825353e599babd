//! `MouseTrail` data type and the `MouseTrailTracker` scoring helper shared
//! between `MouseCapture` (recording) and `EvidenceScoringEvaluator`
//! (replay) — spec §3, §4.8.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::strategy::{Rect, ScrollPosition};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseTrailPoint {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
}

/// Bounded ring of absolute-coordinate mouse samples. Points older than the
/// configured TTL are dropped on every push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouseTrail {
    points: VecDeque<MouseTrailPoint>,
    #[serde(skip, default = "default_ttl")]
    ttl: Duration,
}

fn default_ttl() -> Duration {
    Duration::from_secs(5)
}

impl Default for MouseTrail {
    fn default() -> Self {
        Self::new(default_ttl())
    }
}

impl MouseTrail {
    pub fn new(ttl: Duration) -> Self {
        Self {
            points: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, point: MouseTrailPoint) {
        self.points.push_back(point);
        self.prune(point.timestamp_ms);
    }

    fn prune(&mut self, now_ms: u64) {
        let ttl_ms = self.ttl.as_millis() as u64;
        while let Some(front) = self.points.front() {
            if now_ms.saturating_sub(front.timestamp_ms) > ttl_ms {
                self.points.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &MouseTrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn snapshot(&self) -> Vec<MouseTrailPoint> {
        self.points.iter().copied().collect()
    }

    pub fn last(&self) -> Option<&MouseTrailPoint> {
        self.points.back()
    }

    pub fn total_distance(&self) -> f64 {
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| distance((a.x, a.y), (b.x, b.y)))
            .sum()
    }

    pub fn direction_reversals(&self) -> u32 {
        let vectors: Vec<(f64, f64)> = self
            .points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| (b.x - a.x, b.y - a.y))
            .collect();

        vectors
            .iter()
            .zip(vectors.iter().skip(1))
            .filter(|(a, b)| dot(**a, **b) < 0.0)
            .count() as u32
    }

    /// Direction unit vector derived from the last up-to-5 points.
    pub fn recent_direction(&self) -> (f64, f64) {
        let tail: Vec<&MouseTrailPoint> = self.points.iter().rev().take(5).collect();
        if tail.len() < 2 {
            return (0.0, 0.0);
        }
        let first = tail.last().unwrap();
        let last = tail.first().unwrap();
        let dx = last.x - first.x;
        let dy = last.y - first.y;
        let mag = (dx * dx + dy * dy).sqrt();
        if mag < f64::EPSILON {
            (0.0, 0.0)
        } else {
            (dx / mag, dy / mag)
        }
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

/// `analyzeTrajectoryToElement` from spec §4.8: approach ratio (weighted
/// 0.6) plus final-point proximity (weighted 0.4), in `[0, 1]`.
pub struct MouseTrailTracker;

impl MouseTrailTracker {
    /// Score how well `trail` approaches `bounds`, without scroll
    /// compensation.
    pub fn analyze_trajectory_to_element(bounds: Rect, trail: &[MouseTrailPoint]) -> f64 {
        Self::analyze_with_scroll(bounds, trail, ScrollPosition { x: 0.0, y: 0.0 }, ScrollPosition { x: 0.0, y: 0.0 })
    }

    /// Scroll-compensated variant: adjusts `bounds` by the delta between
    /// the recorded and current scroll offsets before scoring (spec §4.8,
    /// §GLOSSARY "Scroll compensation").
    pub fn analyze_with_scroll(
        bounds: Rect,
        trail: &[MouseTrailPoint],
        recorded_scroll: ScrollPosition,
        current_scroll: ScrollPosition,
    ) -> f64 {
        if trail.len() < 2 {
            return 0.0;
        }

        let dx = current_scroll.x - recorded_scroll.x;
        let dy = current_scroll.y - recorded_scroll.y;
        let adjusted = Rect {
            x: bounds.x - dx,
            y: bounds.y - dy,
            width: bounds.width,
            height: bounds.height,
        };
        let center = adjusted.center();

        let distances: Vec<f64> = trail
            .iter()
            .map(|p| distance((p.x, p.y), center))
            .collect();

        let decreasing_pairs = distances
            .iter()
            .zip(distances.iter().skip(1))
            .filter(|(a, b)| b <= a)
            .count();
        let total_pairs = distances.len().saturating_sub(1).max(1);
        let approach_ratio = decreasing_pairs as f64 / total_pairs as f64;

        let last_distance = *distances.last().unwrap();
        let diag = (adjusted.width.powi(2) + adjusted.height.powi(2)).sqrt().max(1.0);
        let proximity = (1.0 - (last_distance / (diag * 2.0)).min(1.0)).max(0.0);

        (approach_ratio * 0.6 + proximity * 0.4).clamp(0.0, 1.0)
    }
}
