//! Screenshot + OCR resolution (spec §4.3 `vision_ocr`).

use async_trait::async_trait;

use crate::config::ScoringThresholds;
use crate::error::ErrorKind;
use crate::ports::OcrWord;
use crate::strategy::{Rect, Strategy, StrategyKind, StrategyMetadata};

use super::{EvalResult, EvaluationContext, ResolvedTarget, StrategyEvaluator};

pub struct VisionOcrEvaluator {
    pub thresholds: ScoringThresholds,
}

impl Default for VisionOcrEvaluator {
    fn default() -> Self {
        Self {
            thresholds: ScoringThresholds::default(),
        }
    }
}

const HANDLED: &[StrategyKind] = &[StrategyKind::VisionOcr];

fn rect_distance(a: Rect, b: Rect) -> f64 {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// The OCR word closest to `recorded_bbox` among those matching `target_text`
/// case-insensitively as a substring.
fn closest_match<'a>(words: &'a [OcrWord], target_text: &str, recorded_bbox: Rect) -> Option<&'a OcrWord> {
    let needle = target_text.to_lowercase();
    words
        .iter()
        .filter(|w| w.text.to_lowercase().contains(&needle))
        .min_by(|a, b| rect_distance(a.bbox, recorded_bbox).total_cmp(&rect_distance(b.bbox, recorded_bbox)))
}

#[async_trait]
impl StrategyEvaluator for VisionOcrEvaluator {
    fn handled_kinds(&self) -> &'static [StrategyKind] {
        HANDLED
    }

    async fn evaluate(&self, strategy: &Strategy, ctx: &EvaluationContext<'_>) -> EvalResult {
        let StrategyMetadata::VisionOcr { target_text, recorded_bbox } = &strategy.metadata else {
            return EvalResult::not_found(ErrorKind::InvalidMessage);
        };

        let screenshot = match ctx.vision.capture_screenshot(ctx.tab_id).await {
            Ok(bytes) => bytes,
            Err(_) => return EvalResult::not_found(ErrorKind::VisionInitFailed),
        };

        let region = (
            recorded_bbox.x - recorded_bbox.width,
            recorded_bbox.y - recorded_bbox.height,
            recorded_bbox.width * 3.0,
            recorded_bbox.height * 3.0,
        );

        let ocr = match ctx.vision.recognize(&screenshot, Some(region)).await {
            Ok(result) => result,
            Err(_) => return EvalResult::not_found(ErrorKind::VisionOcrFailed),
        };

        if ocr.confidence < self.thresholds.ocr_confidence_floor {
            return EvalResult::not_found(ErrorKind::VisionConfidenceLow);
        }

        let Some(word) = closest_match(&ocr.words, target_text, *recorded_bbox) else {
            return EvalResult::not_found(ErrorKind::ElementNotFound);
        };

        // No resolved DOM node exists for a vision hit; the dispatcher clicks
        // the matched box's screen coordinates directly (spec §4.3 "click
        // point = matched box center").
        EvalResult::found(
            ocr.confidence as f64 / 100.0,
            ResolvedTarget {
                node_id: None,
                bounding_rect: word.bbox,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64) -> OcrWord {
        OcrWord {
            text: text.into(),
            confidence: 90,
            bbox: Rect { x, y, width: 10.0, height: 10.0 },
        }
    }

    #[test]
    fn closest_match_prefers_nearest_bbox() {
        let words = vec![word("Submit", 500.0, 500.0), word("submit order", 100.0, 100.0)];
        let recorded = Rect { x: 100.0, y: 100.0, width: 10.0, height: 10.0 };
        let found = closest_match(&words, "submit", recorded).unwrap();
        assert_eq!(found.bbox.x, 100.0);
    }

    #[test]
    fn closest_match_is_case_insensitive_substring() {
        let words = vec![word("SUBMIT ORDER", 0.0, 0.0)];
        let recorded = Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        assert!(closest_match(&words, "submit", recorded).is_some());
    }

    #[test]
    fn no_matching_word_returns_none() {
        let words = vec![word("Cancel", 0.0, 0.0)];
        let recorded = Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        assert!(closest_match(&words, "submit", recorded).is_none());
    }
}
