//! Composite confidence scoring for detected transitions.

use crate::config::ScoringConfig;
use crate::core::detector::MicroexpressionCandidate;
use crate::core::emotion::ExpressionLabel;
use serde::{Deserialize, Serialize};

/// A scored microexpression, ready for threshold gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroexpressionEvent {
    pub label: ExpressionLabel,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_ms: i64,
    pub composite_score: f64,
}

/// The factors behind a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_confidence: f64,
    pub emotion_strength: f64,
    pub duration_factor: f64,
    pub composite: f64,
}

/// Scores candidates as `base_confidence * emotion_strength * duration_factor`.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Linear falloff around the ideal duration: 1.0 at the ideal, 0 at
    /// `ideal ± tolerance` and beyond.
    pub fn duration_factor(&self, duration_ms: i64) -> f64 {
        if self.config.duration_tolerance_ms <= 0.0 {
            return 0.0;
        }
        let distance = (duration_ms as f64 - self.config.ideal_duration_ms).abs();
        (1.0 - distance / self.config.duration_tolerance_ms).max(0.0)
    }

    /// Compute the score factors for a candidate.
    pub fn breakdown(&self, candidate: &MicroexpressionCandidate) -> ScoreBreakdown {
        let duration_factor = self.duration_factor(candidate.duration_ms);
        ScoreBreakdown {
            base_confidence: candidate.base_confidence,
            emotion_strength: candidate.emotion_strength,
            duration_factor,
            composite: candidate.base_confidence * candidate.emotion_strength * duration_factor,
        }
    }

    /// Turn a candidate into a scored event.
    pub fn score(&self, candidate: &MicroexpressionCandidate) -> MicroexpressionEvent {
        MicroexpressionEvent {
            label: candidate.label.clone(),
            start_time: candidate.start_time,
            end_time: candidate.end_time,
            duration_ms: candidate.duration_ms,
            composite_score: self.breakdown(candidate).composite,
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Whether a score clears the gate. The comparison is strict.
pub fn passes_threshold(score: f64, threshold: f64) -> bool {
    score > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(duration_ms: i64, confidence: f64) -> MicroexpressionCandidate {
        MicroexpressionCandidate {
            label: ExpressionLabel::Surprised,
            baseline: ExpressionLabel::Neutral,
            start_time: 0,
            end_time: duration_ms,
            duration_ms,
            base_confidence: confidence,
            emotion_strength: confidence,
            deviation_seq: 2,
        }
    }

    #[test]
    fn test_duration_factor_shape() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.duration_factor(100), 1.0);
        assert_eq!(scorer.duration_factor(0), 0.0);
        assert_eq!(scorer.duration_factor(200), 0.0);
        assert!((scorer.duration_factor(120) - 0.8).abs() < 1e-9);
        assert!((scorer.duration_factor(50) - 0.5).abs() < 1e-9);
        assert_eq!(scorer.duration_factor(350), 0.0);
    }

    #[test]
    fn test_composite_at_ideal_duration() {
        let scorer = ConfidenceScorer::default();
        let event = scorer.score(&candidate(100, 0.9));
        assert!((event.composite_score - 0.81).abs() < 1e-9);
    }

    #[test]
    fn test_composite_at_extremes_is_zero() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.score(&candidate(0, 0.9)).composite_score, 0.0);
        assert_eq!(scorer.score(&candidate(200, 0.9)).composite_score, 0.0);
    }

    #[test]
    fn test_reference_scenario_score() {
        let scorer = ConfidenceScorer::default();
        let breakdown = scorer.breakdown(&candidate(120, 0.8));
        assert!((breakdown.duration_factor - 0.8).abs() < 1e-9);
        assert!((breakdown.composite - 0.512).abs() < 1e-9);
        assert!(!passes_threshold(breakdown.composite, 0.65));
    }

    #[test]
    fn test_gate_is_strict() {
        assert!(!passes_threshold(0.65, 0.65));
        assert!(passes_threshold(0.6500001, 0.65));
    }

    #[test]
    fn test_event_json_round_trip() {
        let event = ConfidenceScorer::default().score(&candidate(100, 0.9));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"label\":\"surprised\""));

        let back: MicroexpressionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, ExpressionLabel::Surprised);
        assert_eq!(back.duration_ms, event.duration_ms);
        assert!((back.composite_score - event.composite_score).abs() < 1e-12);
    }
}
