//! Input types for the Synheart Microexpression engine.
//!
//! These types carry ONLY classifier scores, finalized transcript text,
//! brightness scalars and user feedback - never video frames or audio.

use crate::core::emotion::ExpressionLabel;
use crate::core::light::average_brightness;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One per-frame classification result from the expression classifier.
///
/// The distribution maps raw classifier labels to confidences in `[0, 1]`.
/// Its key order (lexicographic) breaks ties when picking the dominant label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionSample {
    /// Capture time in milliseconds
    pub timestamp: i64,
    /// Label -> confidence
    pub distribution: BTreeMap<String, f64>,
}

impl ExpressionSample {
    pub fn new(timestamp: i64, distribution: BTreeMap<String, f64>) -> Self {
        Self {
            timestamp,
            distribution,
        }
    }

    /// Build a sample from `(label, confidence)` pairs.
    pub fn from_pairs<'a>(timestamp: i64, pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            timestamp,
            distribution: pairs
                .into_iter()
                .map(|(label, confidence)| (label.to_string(), confidence))
                .collect(),
        }
    }

    /// Check the distribution is usable.
    pub fn validate(&self) -> Result<(), SampleError> {
        if self.distribution.is_empty() {
            return Err(SampleError::EmptyDistribution);
        }
        for (label, &confidence) in &self.distribution {
            if !confidence.is_finite() {
                return Err(SampleError::NonFiniteConfidence(label.clone()));
            }
            if !(0.0..=1.0).contains(&confidence) {
                return Err(SampleError::ConfidenceOutOfRange(label.clone(), confidence));
            }
        }
        Ok(())
    }

    /// The label with maximum confidence. First key wins on ties.
    pub fn dominant(&self) -> Option<(ExpressionLabel, f64)> {
        let mut best: Option<(&String, f64)> = None;
        for (label, &confidence) in &self.distribution {
            match best {
                Some((_, max)) if confidence <= max => {}
                _ => best = Some((label, confidence)),
            }
        }
        best.map(|(label, confidence)| (ExpressionLabel::parse(label), confidence))
    }

    /// Confidence the distribution assigns to `label` (0 if absent).
    pub fn confidence_for(&self, label: &ExpressionLabel) -> f64 {
        self.distribution
            .get(label.as_str())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Why a sample was rejected before reaching the window.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    EmptyDistribution,
    NonFiniteConfidence(String),
    ConfidenceOutOfRange(String, f64),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::EmptyDistribution => write!(f, "empty distribution"),
            SampleError::NonFiniteConfidence(label) => {
                write!(f, "non-finite confidence for '{label}'")
            }
            SampleError::ConfidenceOutOfRange(label, value) => {
                write!(f, "confidence {value} for '{label}' outside [0, 1]")
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// A finalized transcript fragment from the speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub timestamp: i64,
    pub text: String,
}

/// Average scene brightness on a 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSample {
    pub timestamp: i64,
    pub brightness: f64,
}

impl LightSample {
    /// Measure brightness from an RGBA pixel buffer.
    pub fn from_rgba(timestamp: i64, pixels: &[u8]) -> Option<Self> {
        average_brightness(pixels).map(|brightness| Self {
            timestamp,
            brightness,
        })
    }
}

/// User feedback on detection quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Feedback {
    /// A shown detection was wrong; carries its composite score
    FalsePositive { confidence: f64 },
    /// The user saw an expression the engine did not report
    MissedDetection,
    /// A detection fired but with the wrong emotion
    EmotionCorrection,
}

/// A feedback report with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub timestamp: i64,
    pub feedback: Feedback,
}

/// Unified input event for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Sample(ExpressionSample),
    Transcript(TranscriptFragment),
    Light(LightSample),
    Feedback(FeedbackEvent),
}

impl InputEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            InputEvent::Sample(e) => e.timestamp,
            InputEvent::Transcript(e) => e.timestamp,
            InputEvent::Light(e) => e.timestamp,
            InputEvent::Feedback(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_label() {
        let sample = ExpressionSample::from_pairs(0, [("happy", 0.7), ("neutral", 0.2), ("sad", 0.1)]);
        let (label, confidence) = sample.dominant().unwrap();
        assert_eq!(label, ExpressionLabel::Happy);
        assert!((confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_tie_takes_first_key() {
        let sample = ExpressionSample::from_pairs(0, [("sad", 0.5), ("angry", 0.5)]);
        assert_eq!(sample.dominant().unwrap().0, ExpressionLabel::Angry);
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            ExpressionSample::from_pairs(0, []).validate(),
            Err(SampleError::EmptyDistribution)
        );
        assert!(matches!(
            ExpressionSample::from_pairs(0, [("happy", f64::NAN)]).validate(),
            Err(SampleError::NonFiniteConfidence(_))
        ));
        assert!(matches!(
            ExpressionSample::from_pairs(0, [("happy", 1.5)]).validate(),
            Err(SampleError::ConfidenceOutOfRange(_, _))
        ));
        assert!(ExpressionSample::from_pairs(0, [("happy", 1.0)]).validate().is_ok());
    }

    #[test]
    fn test_input_event_wire_format() {
        let line = r#"{"kind":"sample","timestamp":120,"distribution":{"neutral":0.85,"happy":0.1}}"#;
        let event: InputEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.timestamp(), 120);

        let line = r#"{"kind":"feedback","timestamp":5,"feedback":{"type":"false_positive","confidence":0.7}}"#;
        let event: InputEvent = serde_json::from_str(line).unwrap();
        assert_eq!(
            event,
            InputEvent::Feedback(FeedbackEvent {
                timestamp: 5,
                feedback: Feedback::FalsePositive { confidence: 0.7 },
            })
        );

        let line = r#"{"kind":"feedback","timestamp":6,"feedback":{"type":"missed_detection"}}"#;
        assert!(serde_json::from_str::<InputEvent>(line).is_ok());
    }

    #[test]
    fn test_light_sample_from_rgba() {
        let pixels = [30u8, 30, 30, 255, 60, 60, 60, 255];
        let sample = LightSample::from_rgba(10, &pixels).unwrap();
        assert!((sample.brightness - 45.0).abs() < 1e-9);
        assert!(LightSample::from_rgba(10, &[]).is_none());
    }
}
