//! Microexpression pattern detection over the sliding window.
//!
//! A microexpression shows up as an A -> B -> A run of dominant labels: the
//! face leaves its resting expression for one frame and returns. The return
//! must land between the physiological limits (40-200ms by default).

use crate::config::DetectionConfig;
use crate::core::buffer::{ExpressionFrame, SlidingWindow};
use crate::core::emotion::ExpressionLabel;
use serde::{Deserialize, Serialize};

/// A detected A -> B -> A transition, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroexpressionCandidate {
    /// Deviation label (B)
    pub label: ExpressionLabel,
    /// Resting label on both sides (A)
    pub baseline: ExpressionLabel,
    /// Timestamp of the frame before the deviation
    pub start_time: i64,
    /// Timestamp of the frame after the deviation
    pub end_time: i64,
    /// `end_time - start_time`
    pub duration_ms: i64,
    /// Deviation frame's confidence for its own dominant label
    pub base_confidence: f64,
    /// Deviation frame's distribution value for the same label
    pub emotion_strength: f64,
    /// Sequence number of the deviation frame
    pub deviation_seq: u64,
}

/// Check one `(start, mid, next)` triple.
fn match_triple(
    start: &ExpressionFrame,
    mid: &ExpressionFrame,
    next: &ExpressionFrame,
    config: &DetectionConfig,
) -> Option<MicroexpressionCandidate> {
    if start.label != next.label || start.label == mid.label || mid.label == next.label {
        return None;
    }

    let duration_ms = next.timestamp().saturating_sub(start.timestamp());
    if duration_ms < config.min_duration_ms || duration_ms > config.max_duration_ms {
        return None;
    }

    Some(MicroexpressionCandidate {
        label: mid.label.clone(),
        baseline: start.label.clone(),
        start_time: start.timestamp(),
        end_time: next.timestamp(),
        duration_ms,
        base_confidence: mid.confidence,
        emotion_strength: mid.sample.confidence_for(&mid.label),
        deviation_seq: mid.seq,
    })
}

/// Scan eligible triples whose closing frame is newer than `after_seq`.
///
/// A triple `(i-1, i, i+1)` is eligible when one frame precedes it and one
/// follows it in the window.
fn scan_from(
    window: &SlidingWindow,
    config: &DetectionConfig,
    after_seq: Option<u64>,
) -> (Vec<MicroexpressionCandidate>, Option<u64>) {
    let len = window.len();
    let mut candidates = Vec::new();
    let mut newest_scanned = after_seq;

    if len < config.min_samples.max(5) {
        return (candidates, newest_scanned);
    }

    for i in 2..len - 2 {
        let (Some(start), Some(mid), Some(next)) =
            (window.get(i - 1), window.get(i), window.get(i + 1))
        else {
            continue;
        };

        if after_seq.is_some_and(|seen| next.seq <= seen) {
            continue;
        }

        if let Some(candidate) = match_triple(start, mid, next, config) {
            candidates.push(candidate);
        }
        newest_scanned = Some(next.seq);
    }

    (candidates, newest_scanned)
}

/// Scan every eligible triple in the window.
///
/// Multiple qualifying triples each yield a candidate; nothing is deduplicated
/// at this layer.
pub fn scan_window(window: &SlidingWindow, config: &DetectionConfig) -> Vec<MicroexpressionCandidate> {
    scan_from(window, config, None).0
}

/// Incremental detector that evaluates each triple once.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    config: DetectionConfig,
    /// Sequence number of the newest closing frame already scanned
    scanned_through: Option<u64>,
}

impl PatternDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            scanned_through: None,
        }
    }

    /// Scan triples that became eligible since the last call.
    pub fn scan(&mut self, window: &SlidingWindow) -> Vec<MicroexpressionCandidate> {
        let (candidates, scanned_through) = scan_from(window, &self.config, self.scanned_through);
        self.scanned_through = scanned_through;
        candidates
    }
}
