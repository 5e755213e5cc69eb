//! Correlation of accepted microexpressions with the spoken word stream.

use crate::config::MatchingConfig;
use crate::core::emotion::CanonicalEmotion;
use crate::core::scoring::MicroexpressionEvent;
use serde::{Deserialize, Serialize};

/// The two most recent words heard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenWordState {
    pub last_word: String,
    pub current_word: String,
}

impl SpokenWordState {
    /// Shift in the final token of a transcript fragment.
    ///
    /// Fragments without any token leave the state untouched and return false.
    pub fn push_fragment(&mut self, text: &str) -> bool {
        match text.split_whitespace().last() {
            Some(token) => {
                self.last_word = std::mem::replace(&mut self.current_word, token.to_string());
                true
            }
            None => false,
        }
    }

    /// The word a detection pairs with: the current word, else the last one.
    pub fn word_for_match(&self) -> Option<&str> {
        if !self.current_word.is_empty() {
            Some(&self.current_word)
        } else if !self.last_word.is_empty() {
            Some(&self.last_word)
        } else {
            None
        }
    }
}

/// A microexpression correlated with a spoken word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionWordPair {
    pub emotion: CanonicalEmotion,
    pub word: String,
    pub confidence: f64,
    /// Engine clock time of the match, in milliseconds
    pub timestamp: i64,
}

/// Result of offering an event to the matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Emitted(EmotionWordPair),
    /// No word heard yet; the event is discarded
    NoWord,
    /// Same emotion and word already stored within the dedup window
    Duplicate,
}

/// Pairs gated microexpressions with the most recent word.
#[derive(Debug, Clone)]
pub struct SpeechMatcher {
    config: MatchingConfig,
    words: SpokenWordState,
    pairs: Vec<EmotionWordPair>,
}

impl SpeechMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            config,
            words: SpokenWordState::default(),
            pairs: Vec::new(),
        }
    }

    /// Feed a finalized transcript fragment.
    pub fn push_fragment(&mut self, text: &str) -> bool {
        self.words.push_fragment(text)
    }

    pub fn words(&self) -> &SpokenWordState {
        &self.words
    }

    /// Correlate a gated event with the word state at time `now`.
    pub fn correlate(&mut self, event: &MicroexpressionEvent, now: i64) -> MatchOutcome {
        // Speech recognition lags the face; the shifted time is logged only,
        // word selection below always takes the newest word.
        let adjusted_time = event.start_time.saturating_sub(self.config.speech_delay_ms);

        let Some(word) = self.words.word_for_match() else {
            tracing::debug!(label = %event.label, adjusted_time, "no word available, discarding");
            return MatchOutcome::NoWord;
        };

        let pair = EmotionWordPair {
            emotion: event.label.canonical(),
            word: word.to_string(),
            confidence: event.composite_score,
            timestamp: now,
        };

        if self.is_duplicate(&pair) {
            tracing::debug!(emotion = %pair.emotion, word = %pair.word, "duplicate pair suppressed");
            return MatchOutcome::Duplicate;
        }

        tracing::debug!(
            emotion = %pair.emotion,
            word = %pair.word,
            adjusted_time,
            "pair stored"
        );
        self.pairs.push(pair.clone());
        MatchOutcome::Emitted(pair)
    }

    fn is_duplicate(&self, candidate: &EmotionWordPair) -> bool {
        let window = self.config.dedup_window_ms.max(0) as u64;
        self.pairs.iter().rev().any(|existing| {
            existing.emotion == candidate.emotion
                && existing.word == candidate.word
                && candidate.timestamp.abs_diff(existing.timestamp) <= window
        })
    }

    /// Every stored pair, oldest first.
    pub fn pairs(&self) -> &[EmotionWordPair] {
        &self.pairs
    }

    /// The newest `limit` pairs, newest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &EmotionWordPair> {
        self.pairs.iter().rev().take(limit)
    }
}

impl Default for SpeechMatcher {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}
