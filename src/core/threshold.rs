//! Adaptive acceptance threshold.
//!
//! The threshold rises when users report false positives, drifts down when
//! true positives are scarce, and relaxes in low light where the classifier
//! is less certain. Every mutation is clamped to `[min, max]`.

use crate::collector::types::Feedback;
use crate::config::ThresholdConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Score assigned to an emotion-correction report.
const EMOTION_CORRECTION_SCORE: f64 = 0.5;

/// One feedback outcome in the recent history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub score: f64,
    pub is_correct: bool,
}

/// Environmental inputs that bias the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    pub low_light: bool,
}

/// Point-in-time view of the threshold state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSnapshot {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
    pub history_len: usize,
    pub low_light: bool,
}

/// Feedback- and light-driven controller of the acceptance threshold.
#[derive(Debug, Clone)]
pub struct ThresholdManager {
    config: ThresholdConfig,
    current: f64,
    history: VecDeque<ScoreOutcome>,
    false_positive_rate: f64,
    true_positive_rate: f64,
    environment: EnvironmentalConditions,
}

impl ThresholdManager {
    pub fn new(config: ThresholdConfig) -> Self {
        let mut manager = Self {
            current: config.initial,
            history: VecDeque::with_capacity(config.history_capacity),
            false_positive_rate: 0.0,
            true_positive_rate: 0.0,
            environment: EnvironmentalConditions::default(),
            config,
        };
        manager.current = manager.clamp(manager.current);
        manager
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.config.min).min(self.config.max)
    }

    /// Record a scored outcome and re-run the adjustment.
    ///
    /// Both rates are fractions of the same history, so they always sum to
    /// one once the history is non-empty.
    pub fn add_score(&mut self, score: f64, is_correct: bool) {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.history.push_back(ScoreOutcome { score, is_correct });
        while self.history.len() > self.config.history_capacity.max(1) {
            self.history.pop_front();
        }

        let size = self.history.len().max(1) as f64;
        let correct = self.history.iter().filter(|o| o.is_correct).count() as f64;
        let incorrect = self.history.len() as f64 - correct;
        self.true_positive_rate = correct / size;
        self.false_positive_rate = incorrect / size;

        self.adjust_threshold();
    }

    /// Apply the rate rules, then the low-light relaxation.
    pub fn adjust_threshold(&mut self) {
        let step = self.config.adjustment_rate;

        if self.false_positive_rate > self.config.false_positive_ceiling {
            self.current = self.clamp(self.current + step);
        } else if self.true_positive_rate < self.config.true_positive_floor
            && self.false_positive_rate < self.config.false_positive_floor
        {
            self.current = self.clamp(self.current - step);
        }

        if self.environment.low_light {
            self.current = self.clamp(self.current - self.config.low_light_penalty);
        }
    }

    /// Update the environment from the light sampler.
    pub fn update_environmental_conditions(&mut self, conditions: EnvironmentalConditions) {
        self.environment = conditions;
    }

    /// A detection was missed: lower the threshold directly, bypassing the
    /// outcome history.
    pub fn report_missed_detection(&mut self) {
        self.current = self.clamp(self.current - self.config.adjustment_rate);
    }

    /// A detection carried the wrong emotion.
    pub fn report_emotion_correction(&mut self) {
        self.add_score(EMOTION_CORRECTION_SCORE, false);
    }

    /// Route a feedback report. Returns `(previous, current)`.
    pub fn apply_feedback(&mut self, feedback: Feedback) -> (f64, f64) {
        let previous = self.current;
        match feedback {
            Feedback::FalsePositive { confidence } => self.add_score(confidence, false),
            Feedback::MissedDetection => self.report_missed_detection(),
            Feedback::EmotionCorrection => self.report_emotion_correction(),
        }
        (previous, self.current)
    }

    pub fn current_threshold(&self) -> f64 {
        self.current
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    pub fn true_positive_rate(&self) -> f64 {
        self.true_positive_rate
    }

    pub fn environment(&self) -> EnvironmentalConditions {
        self.environment
    }

    pub fn history(&self) -> impl Iterator<Item = &ScoreOutcome> {
        self.history.iter()
    }

    pub fn snapshot(&self) -> ThresholdSnapshot {
        ThresholdSnapshot {
            current: self.current,
            min: self.config.min,
            max: self.config.max,
            false_positive_rate: self.false_positive_rate,
            true_positive_rate: self.true_positive_rate,
            history_len: self.history.len(),
            low_light: self.environment.low_light,
        }
    }
}

impl Default for ThresholdManager {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_initial_threshold() {
        let manager = ThresholdManager::default();
        assert!((manager.current_threshold() - 0.65).abs() < EPS);
    }

    #[test]
    fn test_false_positives_raise_to_max() {
        let mut manager = ThresholdManager::default();
        let mut previous = manager.current_threshold();

        for _ in 0..20 {
            manager.add_score(0.7, false);
            let current = manager.current_threshold();
            let expected = (previous + 0.05).min(0.9);
            assert!((current - expected).abs() < EPS);
            previous = current;
        }

        assert!((manager.false_positive_rate() - 1.0).abs() < EPS);
        assert_eq!(manager.current_threshold(), 0.9);
    }

    #[test]
    fn test_rates_are_complementary() {
        let mut manager = ThresholdManager::default();
        manager.add_score(0.8, true);
        manager.add_score(0.8, true);
        manager.add_score(0.8, false);
        manager.add_score(0.8, true);

        assert!((manager.true_positive_rate() - 0.75).abs() < EPS);
        assert!((manager.false_positive_rate() - 0.25).abs() < EPS);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut manager = ThresholdManager::default();
        for i in 0..50 {
            manager.add_score(0.5, i % 2 == 0);
        }
        assert_eq!(manager.history().count(), 20);
    }

    #[test]
    fn test_low_light_adds_extra_decrease() {
        let mut manager = ThresholdManager::default();
        manager.update_environmental_conditions(EnvironmentalConditions { low_light: true });

        // All-correct history: no rate branch fires, only the light penalty
        manager.add_score(0.8, true);
        assert!((manager.current_threshold() - 0.60).abs() < EPS);

        // False positive branch raises, light penalty cancels it
        let mut manager = ThresholdManager::default();
        manager.update_environmental_conditions(EnvironmentalConditions { low_light: true });
        manager.add_score(0.8, false);
        assert!((manager.current_threshold() - 0.65).abs() < EPS);
    }

    #[test]
    fn test_low_light_clamps_to_min() {
        let mut manager = ThresholdManager::default();
        manager.update_environmental_conditions(EnvironmentalConditions { low_light: true });
        for _ in 0..30 {
            manager.add_score(0.9, true);
        }
        assert_eq!(manager.current_threshold(), 0.4);
    }

    #[test]
    fn test_missed_detection_bypasses_history() {
        let mut manager = ThresholdManager::default();
        let (previous, current) = manager.apply_feedback(Feedback::MissedDetection);
        assert!((previous - current - 0.05).abs() < EPS);
        assert_eq!(manager.history().count(), 0);

        for _ in 0..10 {
            manager.report_missed_detection();
        }
        assert_eq!(manager.current_threshold(), 0.4);
    }

    #[test]
    fn test_emotion_correction_counts_as_false_positive() {
        let mut manager = ThresholdManager::default();
        manager.apply_feedback(Feedback::EmotionCorrection);

        let outcome = *manager.history().next().unwrap();
        assert_eq!(outcome, ScoreOutcome { score: 0.5, is_correct: false });
        assert!((manager.current_threshold() - 0.70).abs() < EPS);
    }

    #[test]
    fn test_feedback_score_is_clamped() {
        let mut manager = ThresholdManager::default();
        manager.apply_feedback(Feedback::FalsePositive { confidence: 3.0 });
        manager.apply_feedback(Feedback::FalsePositive { confidence: -1.0 });

        let scores: Vec<f64> = manager.history().map(|o| o.score).collect();
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn test_threshold_stays_in_bounds_under_mixed_feedback() {
        let mut manager = ThresholdManager::default();
        for i in 0..200 {
            match i % 5 {
                0 => manager.add_score(0.6, false),
                1 => manager.report_missed_detection(),
                2 => manager.update_environmental_conditions(EnvironmentalConditions {
                    low_light: i % 3 == 0,
                }),
                3 => manager.report_emotion_correction(),
                _ => manager.add_score(0.9, true),
            }
            let current = manager.current_threshold();
            assert!((0.4..=0.9).contains(&current));
        }
    }
}
