//! The microexpression engine: a single-threaded state machine.
//!
//! Every public operation is a synchronous state transition that returns the
//! output events it produced. Timing decisions use sample timestamps, so the
//! host may drive the engine at any cadence.

use crate::collector::types::{ExpressionSample, Feedback, InputEvent, LightSample};
use crate::config::Config;
use crate::core::buffer::{ExpressionFrame, SlidingWindow};
use crate::core::clock::{Clock, SystemClock};
use crate::core::detector::PatternDetector;
use crate::core::emotion::{CanonicalEmotion, DisplayColor};
use crate::core::light::is_low_light;
use crate::core::matcher::{EmotionWordPair, MatchOutcome, SpeechMatcher, SpokenWordState};
use crate::core::scoring::{passes_threshold, ConfidenceScorer, MicroexpressionEvent};
use crate::core::threshold::{EnvironmentalConditions, ThresholdManager};
use crate::transparency::{create_shared_log, SharedTransparencyLog};
use serde::Serialize;
use std::sync::Arc;

/// The emotion currently shown for the face, independent of detections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveEmotion {
    pub emotion: CanonicalEmotion,
    pub color: DisplayColor,
    pub confidence: f64,
    pub timestamp: i64,
}

/// Output of an engine operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Dominant emotion of a processed sample
    LiveEmotion(LiveEmotion),
    /// A sample was rejected and skipped
    SampleDropped { timestamp: i64, reason: String },
    /// A microexpression scored at or below the threshold
    MicroexpressionGated {
        microexpression: MicroexpressionEvent,
        threshold: f64,
    },
    /// A new emotion-word pair was stored
    PairEmitted(EmotionWordPair),
    /// The spoken word state shifted
    WordsUpdated {
        last_word: String,
        current_word: String,
    },
    /// The low-light flag flipped
    LightChanged { low_light: bool, brightness: f64 },
    /// The acceptance threshold moved
    ThresholdChanged { previous: f64, current: f64 },
}

/// Whether the classifier is feeding the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierStatus {
    /// No sample has arrived yet
    Idle,
    /// Samples are arriving
    Active,
    /// Samples stopped arriving
    Stale,
}

/// Host-facing status summary.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub classifier: ClassifierStatus,
    pub window_len: usize,
    pub threshold: f64,
    pub low_light: bool,
    pub pair_count: usize,
    pub live_emotion: Option<LiveEmotion>,
}

/// Correlates microexpressions in a classifier stream with spoken words.
pub struct MicroexpressionEngine {
    window: SlidingWindow,
    detector: PatternDetector,
    scorer: ConfidenceScorer,
    threshold: ThresholdManager,
    matcher: SpeechMatcher,
    clock: Arc<dyn Clock>,
    log: SharedTransparencyLog,
    live: Option<LiveEmotion>,
    /// Engine clock time of the last accepted sample
    last_sample_at: Option<i64>,
    low_light_cutoff: f64,
    stale_after_ms: i64,
}

impl MicroexpressionEngine {
    /// Create an engine on the system clock with a fresh transparency log.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), create_shared_log())
    }

    /// Create an engine with an explicit clock and transparency log.
    pub fn with_parts(config: &Config, clock: Arc<dyn Clock>, log: SharedTransparencyLog) -> Self {
        Self {
            window: SlidingWindow::new(config.window_capacity),
            detector: PatternDetector::new(config.detection.clone()),
            scorer: ConfidenceScorer::new(config.scoring.clone()),
            threshold: ThresholdManager::new(config.threshold.clone()),
            matcher: SpeechMatcher::new(config.matching.clone()),
            clock,
            log,
            live: None,
            last_sample_at: None,
            low_light_cutoff: config.low_light_cutoff,
            stale_after_ms: config.classifier_stale_after_ms,
        }
    }

    /// Dispatch any input event.
    pub fn push(&mut self, event: InputEvent) -> Vec<EngineEvent> {
        match event {
            InputEvent::Sample(sample) => self.push_sample(sample),
            InputEvent::Transcript(fragment) => self.push_word(&fragment.text),
            InputEvent::Light(light) => self.push_light(light),
            InputEvent::Feedback(feedback) => self.push_feedback(feedback.feedback),
        }
    }

    /// Process one classifier sample.
    ///
    /// Invalid samples are dropped without touching the window. Valid ones
    /// update the live emotion, enter the window, and run a detector pass.
    pub fn push_sample(&mut self, sample: ExpressionSample) -> Vec<EngineEvent> {
        let timestamp = sample.timestamp;
        let frame = match ExpressionFrame::new(sample) {
            Ok(frame) => frame,
            Err(reason) => {
                tracing::warn!(timestamp, %reason, "dropping invalid sample");
                self.log.record_sample_dropped();
                return vec![EngineEvent::SampleDropped {
                    timestamp,
                    reason: reason.to_string(),
                }];
            }
        };

        let now = self.clock.now_ms();
        self.log.record_sample_processed();
        self.last_sample_at = Some(now);

        let emotion = frame.label.canonical();
        let live = LiveEmotion {
            color: emotion.color(),
            emotion,
            confidence: frame.confidence,
            timestamp,
        };
        self.live = Some(live.clone());

        let mut events = vec![EngineEvent::LiveEmotion(live)];

        self.window.push(frame);
        let candidates = self.detector.scan(&self.window);
        if candidates.is_empty() {
            return events;
        }
        self.log.record_candidates(candidates.len() as u64);

        for candidate in &candidates {
            let event = self.scorer.score(candidate);
            let threshold = self.threshold.current_threshold();

            if !passes_threshold(event.composite_score, threshold) {
                tracing::debug!(
                    label = %event.label,
                    duration_ms = event.duration_ms,
                    score = event.composite_score,
                    threshold,
                    "microexpression below threshold"
                );
                self.log.record_gated_out();
                events.push(EngineEvent::MicroexpressionGated {
                    microexpression: event,
                    threshold,
                });
                continue;
            }

            match self.matcher.correlate(&event, now) {
                MatchOutcome::Emitted(pair) => {
                    tracing::info!(
                        emotion = %pair.emotion,
                        word = %pair.word,
                        confidence = pair.confidence,
                        "emotion-word pair"
                    );
                    self.log.record_pair_emitted();
                    events.push(EngineEvent::PairEmitted(pair));
                }
                MatchOutcome::NoWord => self.log.record_unmatched(),
                MatchOutcome::Duplicate => self.log.record_duplicate(),
            }
        }

        events
    }

    /// Process a finalized transcript fragment.
    pub fn push_word(&mut self, text: &str) -> Vec<EngineEvent> {
        self.log.record_transcript_fragment();

        if !self.matcher.push_fragment(text) {
            return Vec::new();
        }

        let words = self.matcher.words();
        vec![EngineEvent::WordsUpdated {
            last_word: words.last_word.clone(),
            current_word: words.current_word.clone(),
        }]
    }

    /// Process an ambient brightness reading.
    pub fn push_light(&mut self, sample: LightSample) -> Vec<EngineEvent> {
        self.log.record_light_sample();

        if !sample.brightness.is_finite() {
            tracing::warn!(timestamp = sample.timestamp, "ignoring non-finite brightness");
            return Vec::new();
        }

        let low_light = is_low_light(sample.brightness, self.low_light_cutoff);
        let was_low = self.threshold.environment().low_light;
        self.threshold
            .update_environmental_conditions(EnvironmentalConditions { low_light });

        if low_light == was_low {
            return Vec::new();
        }

        tracing::info!(brightness = sample.brightness, low_light, "light condition changed");
        vec![EngineEvent::LightChanged {
            low_light,
            brightness: sample.brightness,
        }]
    }

    /// Process a user feedback report.
    pub fn push_feedback(&mut self, feedback: Feedback) -> Vec<EngineEvent> {
        self.log.record_feedback();

        let (previous, current) = self.threshold.apply_feedback(feedback);
        if previous == current {
            return Vec::new();
        }

        tracing::info!(?feedback, previous, current, "threshold adjusted");
        vec![EngineEvent::ThresholdChanged { previous, current }]
    }

    /// Every stored pair, oldest first. The engine never truncates this list.
    pub fn pairs(&self) -> &[EmotionWordPair] {
        self.matcher.pairs()
    }

    /// The newest `limit` pairs, newest first, for display.
    pub fn recent_pairs(&self, limit: usize) -> Vec<&EmotionWordPair> {
        self.matcher.recent(limit).collect()
    }

    /// The last displayed emotion. Persists while the classifier is idle.
    pub fn live_emotion(&self) -> Option<&LiveEmotion> {
        self.live.as_ref()
    }

    pub fn words(&self) -> &SpokenWordState {
        self.matcher.words()
    }

    pub fn threshold(&self) -> &ThresholdManager {
        &self.threshold
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn log(&self) -> &SharedTransparencyLog {
        &self.log
    }

    /// Current status, including whether the classifier has gone quiet.
    pub fn status(&self) -> EngineStatus {
        let classifier = match self.last_sample_at {
            None => ClassifierStatus::Idle,
            Some(at) if self.clock.now_ms().saturating_sub(at) > self.stale_after_ms => {
                ClassifierStatus::Stale
            }
            Some(_) => ClassifierStatus::Active,
        };

        EngineStatus {
            classifier,
            window_len: self.window.len(),
            threshold: self.threshold.current_threshold(),
            low_light: self.threshold.environment().low_light,
            pair_count: self.matcher.pairs().len(),
            live_emotion: self.live.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn engine_with_clock() -> (MicroexpressionEngine, ManualClock) {
        let clock = ManualClock::new(0);
        let engine = MicroexpressionEngine::with_parts(
            &Config::default(),
            Arc::new(clock.clone()),
            create_shared_log(),
        );
        (engine, clock)
    }

    fn sample(timestamp: i64, label: &str, confidence: f64) -> ExpressionSample {
        ExpressionSample::from_pairs(timestamp, [(label, confidence)])
    }

    #[test]
    fn test_live_emotion_on_every_sample() {
        let (mut engine, _) = engine_with_clock();
        let events = engine.push_sample(sample(0, "happy", 0.9));

        assert_eq!(events.len(), 1);
        match &events[0] {
            EngineEvent::LiveEmotion(live) => {
                assert_eq!(live.emotion, CanonicalEmotion::Enjoyment);
                assert_eq!(live.color, DisplayColor::YELLOW);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_invalid_sample_skipped() {
        let (mut engine, _) = engine_with_clock();
        engine.push_sample(sample(0, "sad", 0.9));

        let events = engine.push_sample(ExpressionSample::from_pairs(16, []));
        assert!(matches!(events[0], EngineEvent::SampleDropped { timestamp: 16, .. }));
        assert_eq!(engine.window().len(), 1);

        // Live emotion persists through the bad sample
        assert_eq!(engine.live_emotion().unwrap().emotion, CanonicalEmotion::Sadness);
        assert_eq!(engine.log().stats().samples_dropped, 1);
    }

    #[test]
    fn test_light_change_reported_once() {
        let (mut engine, _) = engine_with_clock();
        let dark = LightSample { timestamp: 0, brightness: 20.0 };

        assert_eq!(engine.push_light(dark).len(), 1);
        assert!(engine.push_light(dark).is_empty());
        assert!(engine.status().low_light);

        let bright = LightSample { timestamp: 5_000, brightness: 120.0 };
        assert!(matches!(
            engine.push_light(bright)[0],
            EngineEvent::LightChanged { low_light: false, .. }
        ));
    }

    #[test]
    fn test_feedback_reports_threshold_change() {
        let (mut engine, _) = engine_with_clock();
        let events = engine.push_feedback(Feedback::FalsePositive { confidence: 0.7 });

        match events[0] {
            EngineEvent::ThresholdChanged { previous, current } => {
                assert!((previous - 0.65).abs() < 1e-9);
                assert!((current - 0.70).abs() < 1e-9);
            }
            ref other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_feedback_at_bound_emits_nothing() {
        let (mut engine, _) = engine_with_clock();
        for _ in 0..10 {
            engine.push_feedback(Feedback::MissedDetection);
        }
        assert!(engine.push_feedback(Feedback::MissedDetection).is_empty());
    }

    #[test]
    fn test_classifier_status() {
        let (mut engine, clock) = engine_with_clock();
        assert_eq!(engine.status().classifier, ClassifierStatus::Idle);

        engine.push_sample(sample(0, "neutral", 0.9));
        assert_eq!(engine.status().classifier, ClassifierStatus::Active);

        clock.advance(2_500);
        assert_eq!(engine.status().classifier, ClassifierStatus::Stale);
    }

    #[test]
    fn test_word_updates() {
        let (mut engine, _) = engine_with_clock();
        assert!(engine.push_word("  ").is_empty());

        let events = engine.push_word("so anyway");
        assert_eq!(
            events,
            vec![EngineEvent::WordsUpdated {
                last_word: String::new(),
                current_word: "anyway".to_string(),
            }]
        );
    }

    #[test]
    fn test_gated_event_serializes_with_tag() {
        let (mut engine, _) = engine_with_clock();
        let mut events = Vec::new();
        for (t, label, confidence) in [
            (0, "neutral", 0.9),
            (20, "neutral", 0.9),
            (80, "surprised", 0.8),
            (140, "neutral", 0.9),
            (160, "neutral", 0.9),
        ] {
            events.extend(engine.push_sample(sample(t, label, confidence)));
        }

        let gated = events
            .iter()
            .find(|e| matches!(e, EngineEvent::MicroexpressionGated { .. }))
            .expect("reference event should be gated");
        let json = serde_json::to_value(gated).unwrap();

        assert_eq!(json["event"], "microexpression_gated");
        assert_eq!(json["microexpression"]["label"], "surprised");
        assert_eq!(json["microexpression"]["duration_ms"], 120);
        assert_eq!(json["threshold"], 0.65);
    }

    #[test]
    fn test_status_survives_extreme_sample_time() {
        let (mut engine, clock) = engine_with_clock();
        clock.set(i64::MIN);
        engine.push_sample(sample(i64::MIN, "neutral", 0.9));

        clock.set(i64::MAX);
        assert_eq!(engine.status().classifier, ClassifierStatus::Stale);
    }
}
