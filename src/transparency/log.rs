//! Privacy-preserving transparency log.
//!
//! This module tracks and exposes statistics about what the engine processed
//! without storing any frames, audio, or transcript text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Classifier samples accepted into the window
    samples_processed: AtomicU64,
    /// Classifier samples rejected as malformed
    samples_dropped: AtomicU64,
    /// Transcript fragments received
    transcript_fragments: AtomicU64,
    /// Light-level readings received
    light_samples: AtomicU64,
    /// Feedback reports received
    feedback_events: AtomicU64,
    /// A -> B -> A transitions found by the detector
    candidates_detected: AtomicU64,
    /// Candidates whose score did not clear the threshold
    candidates_gated_out: AtomicU64,
    /// Emotion-word pairs stored
    pairs_emitted: AtomicU64,
    /// Pairs suppressed as duplicates
    duplicates_suppressed: AtomicU64,
    /// Gated events discarded because no word was available
    unmatched_events: AtomicU64,
    /// Input lines that failed to parse
    malformed_inputs: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            samples_processed: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            transcript_fragments: AtomicU64::new(0),
            light_samples: AtomicU64::new(0),
            feedback_events: AtomicU64::new(0),
            candidates_detected: AtomicU64::new(0),
            candidates_gated_out: AtomicU64::new(0),
            pairs_emitted: AtomicU64::new(0),
            duplicates_suppressed: AtomicU64::new(0),
            unmatched_events: AtomicU64::new(0),
            malformed_inputs: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    pub fn record_sample_processed(&self) {
        self.samples_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transcript_fragment(&self) {
        self.transcript_fragments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_light_sample(&self) {
        self.light_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feedback(&self) {
        self.feedback_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record candidates found in one detector pass.
    pub fn record_candidates(&self, count: u64) {
        self.candidates_detected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_gated_out(&self) {
        self.candidates_gated_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pair_emitted(&self) {
        self.pairs_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmatched(&self) {
        self.unmatched_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_input(&self) {
        self.malformed_inputs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            samples_processed: self.samples_processed.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            transcript_fragments: self.transcript_fragments.load(Ordering::Relaxed),
            light_samples: self.light_samples.load(Ordering::Relaxed),
            feedback_events: self.feedback_events.load(Ordering::Relaxed),
            candidates_detected: self.candidates_detected.load(Ordering::Relaxed),
            candidates_gated_out: self.candidates_gated_out.load(Ordering::Relaxed),
            pairs_emitted: self.pairs_emitted.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
            unmatched_events: self.unmatched_events.load(Ordering::Relaxed),
            malformed_inputs: self.malformed_inputs.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Classifier samples processed: {}\n\
             - Classifier samples dropped: {}\n\
             - Transcript fragments: {}\n\
             - Light readings: {}\n\
             - Feedback reports: {}\n\
             - Microexpressions detected: {}\n\
             - Below threshold: {}\n\
             - Emotion-word pairs: {}\n\
             - Duplicates suppressed: {}\n\
             - Unmatched (no word): {}\n\
             - Malformed input lines: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No video frames retained\n\
             - No audio captured\n\
             - Only matched words stored, never full transcripts",
            stats.samples_processed,
            stats.samples_dropped,
            stats.transcript_fragments,
            stats.light_samples,
            stats.feedback_events,
            stats.candidates_detected,
            stats.candidates_gated_out,
            stats.pairs_emitted,
            stats.duplicates_suppressed,
            stats.unmatched_events,
            stats.malformed_inputs,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_processed: stats.samples_processed,
                samples_dropped: stats.samples_dropped,
                transcript_fragments: stats.transcript_fragments,
                candidates_detected: stats.candidates_detected,
                pairs_emitted: stats.pairs_emitted,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load cumulative stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_processed
                    .store(persisted.samples_processed, Ordering::Relaxed);
                self.samples_dropped
                    .store(persisted.samples_dropped, Ordering::Relaxed);
                self.transcript_fragments
                    .store(persisted.transcript_fragments, Ordering::Relaxed);
                self.candidates_detected
                    .store(persisted.candidates_detected, Ordering::Relaxed);
                self.pairs_emitted
                    .store(persisted.pairs_emitted, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.samples_processed,
            &self.samples_dropped,
            &self.transcript_fragments,
            &self.light_samples,
            &self.feedback_events,
            &self.candidates_detected,
            &self.candidates_gated_out,
            &self.pairs_emitted,
            &self.duplicates_suppressed,
            &self.unmatched_events,
            &self.malformed_inputs,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub samples_processed: u64,
    pub samples_dropped: u64,
    pub transcript_fragments: u64,
    pub light_samples: u64,
    pub feedback_events: u64,
    pub candidates_detected: u64,
    pub candidates_gated_out: u64,
    pub pairs_emitted: u64,
    pub duplicates_suppressed: u64,
    pub unmatched_events: u64,
    pub malformed_inputs: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Cumulative stats kept across sessions.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_processed: u64,
    samples_dropped: u64,
    transcript_fragments: u64,
    candidates_detected: u64,
    pairs_emitted: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_sample_processed();
        log.record_sample_processed();
        log.record_sample_dropped();
        log.record_candidates(3);

        let stats = log.stats();
        assert_eq!(stats.samples_processed, 2);
        assert_eq!(stats.samples_dropped, 1);
        assert_eq!(stats.candidates_detected, 3);
    }

    #[test]
    fn test_transparency_log_reset() {
        let log = TransparencyLog::new();

        log.record_candidates(100);
        log.record_pair_emitted();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.candidates_detected, 0);
        assert_eq!(stats.pairs_emitted, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("synheart-micro-log-{}", uuid::Uuid::new_v4()))
            .join("transparency.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_sample_processed();
        log.record_pair_emitted();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.samples_processed, 1);
        assert_eq!(stats.pairs_emitted, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Classifier samples processed"));
        assert!(summary.contains("Emotion-word pairs"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("No audio captured"));
    }
}
