//! Core functionality for the Synheart Microexpression engine.
//!
//! This module contains:
//! - The emotion mapping table and light measurement
//! - The sliding window, pattern detector and confidence scorer
//! - The adaptive threshold and the speech matcher
//! - The engine tying them together, and session report export

pub mod buffer;
pub mod clock;
pub mod detector;
pub mod emotion;
pub mod engine;
pub mod light;
pub mod matcher;
pub mod report;
pub mod scoring;
pub mod threshold;

// Re-export commonly used types
pub use buffer::{ExpressionFrame, SlidingWindow, DEFAULT_WINDOW_CAPACITY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use detector::{scan_window, MicroexpressionCandidate, PatternDetector};
pub use emotion::{CanonicalEmotion, DisplayColor, ExpressionLabel};
pub use engine::{ClassifierStatus, EngineEvent, EngineStatus, LiveEmotion, MicroexpressionEngine};
pub use light::{average_brightness, is_low_light};
pub use matcher::{EmotionWordPair, MatchOutcome, SpeechMatcher, SpokenWordState};
pub use report::{ReportBuilder, SessionReport, PRODUCER_NAME, REPORT_VERSION};
pub use scoring::{passes_threshold, ConfidenceScorer, MicroexpressionEvent, ScoreBreakdown};
pub use threshold::{EnvironmentalConditions, ThresholdManager, ThresholdSnapshot};
