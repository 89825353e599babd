//! Learned n-grams of step labels used by `EvidenceScoringEvaluator`'s
//! sequence axis (spec §3 `SequencePattern`, §4.8 `SequencePatternAnalyzer`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, OnceLock};

/// Window sizes learned, per spec (`n in {2, 3, 4}`).
const WINDOW_SIZES: [usize; 3] = [2, 3, 4];

/// Current exported-blob schema version. Loaders reject a `major` mismatch
/// and accept any `minor`.
pub const PATTERN_SCHEMA_VERSION: (u32, u32) = (1, 0);

fn numeric_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/\d+(/|$)").unwrap())
}

/// Wildcards numeric path segments so patterns generalize across records
/// (e.g. `/orders/482/edit` -> `/orders/*/edit`).
pub fn wildcard_url_pattern(path: &str) -> String {
    numeric_segment().replace_all(path, "/*$1").to_string()
}

/// Fraction of same-length windows agreeing position-by-position.
fn positional_fit(a: &[String], b: &[String]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

/// Jaccard similarity between two windows' label sets, independent of
/// position or exact length — the "overall" resemblance of two sequences.
fn label_set_similarity(a: &[String], b: &[String]) -> f64 {
    let sa: HashSet<&String> = a.iter().collect();
    let sb: HashSet<&String> = b.iter().collect();
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count().max(1);
    intersection as f64 / union as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePattern {
    pub page_url_pattern: String,
    pub label_sequence: Vec<String>,
    pub occurrences: u32,
}

impl SequencePattern {
    /// Derived confidence: occurrences saturate toward 1.0, never reaching it.
    pub fn confidence(&self) -> f64 {
        1.0 - 1.0 / (1.0 + self.occurrences as f64 / 3.0)
    }
}

/// Versioned export blob for cross-session persistence (spec §4.8, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStoreBlob {
    pub version: (u32, u32),
    pub exported_at_ms: u64,
    pub patterns: Vec<SequencePattern>,
}

/// Learns windowed n-grams of step labels per page-URL pattern and scores
/// candidates against them. State is dirty-flagged; `take_dirty` lets the
/// owning session auto-save on a debounce.
pub struct SequencePatternAnalyzer {
    patterns: Mutex<HashMap<(String, Vec<String>), SequencePattern>>,
    dirty: Mutex<bool>,
}

impl Default for SequencePatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencePatternAnalyzer {
    pub fn new() -> Self {
        Self {
            patterns: Mutex::new(HashMap::new()),
            dirty: Mutex::new(false),
        }
    }

    /// Observes a completed step sequence for a page, recording every
    /// window of size 2..=4 ending at the latest label.
    pub fn observe(&self, page_url: &str, labels: &[String]) {
        let pattern_key = wildcard_url_pattern(page_url);
        let mut store = self.patterns.lock().unwrap();
        for &w in WINDOW_SIZES.iter() {
            if labels.len() < w {
                continue;
            }
            let window = labels[labels.len() - w..].to_vec();
            let key = (pattern_key.clone(), window.clone());
            store
                .entry(key)
                .and_modify(|p| p.occurrences += 1)
                .or_insert_with(|| SequencePattern {
                    page_url_pattern: pattern_key.clone(),
                    label_sequence: window,
                    occurrences: 1,
                });
        }
        *self.dirty.lock().unwrap() = true;
    }

    /// Scores a candidate label against the learned patterns for this page
    /// and preceding label sequence: pattern confidence x label-fit x
    /// overall label-similarity (spec §4.8).
    ///
    /// `label_fit` is the fraction of window positions where the candidate
    /// window (preceding labels + the candidate) agrees with a learned
    /// window of the same length, so a near-miss still scores partial
    /// credit rather than all-or-nothing. `label_similarity` is the
    /// Jaccard overlap between the two windows' label *sets*, rewarding
    /// patterns that share the same vocabulary even when positions or
    /// window length differ slightly.
    pub fn score_candidate(&self, page_url: &str, prior_labels: &[String], candidate_label: &str) -> f64 {
        let pattern_key = wildcard_url_pattern(page_url);
        let store = self.patterns.lock().unwrap();

        let mut best = 0.0_f64;
        for &w in WINDOW_SIZES.iter() {
            if prior_labels.len() + 1 < w {
                continue;
            }
            let context_len = w - 1;
            let context = &prior_labels[prior_labels.len() - context_len..];
            let mut candidate_window = context.to_vec();
            candidate_window.push(candidate_label.to_string());

            for (key, pattern) in store.iter() {
                if key.0 != pattern_key || key.1.len() != candidate_window.len() {
                    continue;
                }
                let label_fit = positional_fit(&candidate_window, &key.1);
                if label_fit <= 0.0 {
                    continue;
                }
                let label_similarity = label_set_similarity(&candidate_window, &key.1);
                let score = pattern.confidence() * label_fit * label_similarity;
                if score > best {
                    best = score;
                }
            }
        }
        best
    }

    pub fn is_dirty(&self) -> bool {
        *self.dirty.lock().unwrap()
    }

    /// Clears the dirty flag and returns the current blob, for the caller
    /// to persist on its debounce.
    pub fn take_dirty(&self, now_ms: u64) -> Option<PatternStoreBlob> {
        let mut dirty = self.dirty.lock().unwrap();
        if !*dirty {
            return None;
        }
        *dirty = false;
        let patterns = self.patterns.lock().unwrap().values().cloned().collect();
        Some(PatternStoreBlob {
            version: PATTERN_SCHEMA_VERSION,
            exported_at_ms: now_ms,
            patterns,
        })
    }

    /// Loads a previously exported blob. Best-effort and non-fatal: a
    /// `major` version mismatch is rejected (returns `false`) rather than
    /// raised as an error, matching the spec's "pattern load on startup is
    /// best-effort and non-fatal".
    pub fn load(&self, blob: &PatternStoreBlob) -> bool {
        if blob.version.0 != PATTERN_SCHEMA_VERSION.0 {
            return false;
        }
        let mut store = self.patterns.lock().unwrap();
        for pattern in &blob.patterns {
            let key = (pattern.page_url_pattern.clone(), pattern.label_sequence.clone());
            store.insert(key, pattern.clone());
        }
        true
    }
}
