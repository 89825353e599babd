//! Network activity evidence collector (spec §4.1 `NetworkCapture`).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::OnceLock;

use regex::Regex;

use crate::record::event::EventContext;

use super::CaptureLayer;

const REDACTED_PARAMS: &[&str] = &["token", "key", "secret", "password", "auth"];

fn ignore_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"\.(png|jpe?g|gif|svg|webp|ico|woff2?|ttf|css)(\?|$)").unwrap(),
            Regex::new(r"(?i)(analytics|segment\.io|google-analytics|doubleclick|mixpanel)").unwrap(),
        ]
    })
}

/// Redacts known auth query parameters from a URL's query string.
pub fn sanitize_url(url: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let sanitized: Vec<String> = query
        .split('&')
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let key_lower = key.to_ascii_lowercase();
            if REDACTED_PARAMS.iter().any(|p| key_lower.contains(p)) {
                format!("{key}=REDACTED")
            } else {
                pair.to_string()
            }
        })
        .collect();
    format!("{path}?{}", sanitized.join("&"))
}

pub fn should_ignore(url: &str) -> bool {
    ignore_patterns().iter().any(|re| re.is_match(url))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub url_path: String,
    pub method: String,
    pub status: Option<u16>,
    pub start_ms: u64,
    pub end_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub recent: Vec<NetworkSample>,
    pub pending_count: usize,
    /// `pendingCount == 0 && document.readyState == "complete"`.
    pub was_idle: bool,
}

/// Bounded ring of recent request samples, with ignore-pattern filtering and
/// auth-parameter redaction.
pub struct NetworkCapture {
    running: bool,
    ring: Mutex<VecDeque<NetworkSample>>,
    capacity: usize,
    pending: Mutex<usize>,
}

impl NetworkCapture {
    pub fn new(capacity: usize) -> Self {
        Self {
            running: false,
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            pending: Mutex::new(0),
        }
    }

    pub fn on_request_start(&self, url: &str, method: &str, start_ms: u64) {
        if !self.running || should_ignore(url) {
            return;
        }
        let sample = NetworkSample {
            url_path: sanitize_url(url),
            method: method.to_string(),
            status: None,
            start_ms,
            end_ms: None,
        };
        if let Ok(mut pending) = self.pending.lock() {
            *pending += 1;
        }
        if let Ok(mut ring) = self.ring.lock() {
            if ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(sample);
        }
    }

    pub fn on_request_end(&self, url: &str, status: u16, end_ms: u64) {
        if !self.running {
            return;
        }
        if let Ok(mut pending) = self.pending.lock() {
            *pending = pending.saturating_sub(1);
        }
        let sanitized = sanitize_url(url);
        if let Ok(mut ring) = self.ring.lock() {
            if let Some(sample) = ring.iter_mut().rev().find(|s| s.url_path == sanitized && s.end_ms.is_none()) {
                sample.status = Some(status);
                sample.end_ms = Some(end_ms);
            }
        }
    }
}

impl CaptureLayer for NetworkCapture {
    type Snapshot = NetworkSnapshot;

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        if let Ok(mut ring) = self.ring.lock() {
            ring.clear();
        }
        if let Ok(mut pending) = self.pending.lock() {
            *pending = 0;
        }
    }

    fn snapshot(&self, _ctx: &EventContext) -> Option<NetworkSnapshot> {
        if !self.running {
            return None;
        }
        let recent: Vec<NetworkSample> = self.ring.lock().ok()?.iter().cloned().collect();
        let pending_count = *self.pending.lock().ok()?;
        Some(NetworkSnapshot {
            was_idle: pending_count == 0,
            pending_count,
            recent,
        })
    }
}
