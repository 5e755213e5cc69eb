//! Session report export.
//!
//! A report captures the correlated emotion-word pairs of one session along
//! with the threshold state and processing statistics that produced them.

use crate::core::engine::MicroexpressionEngine;
use crate::core::matcher::EmotionWordPair;
use crate::core::threshold::ThresholdSnapshot;
use crate::transparency::TransparencyStats;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "synheart-microexpression";

/// Producer metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// Privacy declaration carried in every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPrivacy {
    pub contains_video: bool,
    pub contains_audio: bool,
    pub contains_full_transcript: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for ReportPrivacy {
    fn default() -> Self {
        Self {
            contains_video: false,
            contains_audio: false,
            contains_full_transcript: false,
            notes: Some(
                "Only classifier scores and the single word matched to each detection are kept"
                    .to_string(),
            ),
        }
    }
}

/// Export of one engine session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report format version
    pub report_version: String,
    /// Optional host-supplied session identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Producer metadata
    pub producer: ReportProducer,
    /// When the session started (RFC3339)
    pub started_at_utc: String,
    /// When this report was computed (RFC3339)
    pub computed_at_utc: String,
    /// All stored pairs, oldest first
    pub pairs: Vec<EmotionWordPair>,
    /// Pair count per canonical emotion
    pub emotion_counts: BTreeMap<String, usize>,
    /// Threshold state at export time
    pub threshold: ThresholdSnapshot,
    /// Processing statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TransparencyStats>,
    /// Privacy declaration
    pub privacy: ReportPrivacy,
}

/// Builder for session reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    session_id: Option<String>,
}

impl ReportBuilder {
    /// Create a new report builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            session_id: None,
        }
    }

    /// Set the session ID for generated reports.
    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report from the engine's current state.
    pub fn build(&self, engine: &MicroexpressionEngine) -> SessionReport {
        let stats = engine.log().stats();
        let pairs = engine.pairs().to_vec();

        let mut emotion_counts = BTreeMap::new();
        for pair in &pairs {
            *emotion_counts.entry(pair.emotion.name().to_string()).or_insert(0) += 1;
        }

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            session_id: self.session_id.clone(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
            },
            started_at_utc: stats.session_start.to_rfc3339(),
            computed_at_utc: Utc::now().to_rfc3339(),
            pairs,
            emotion_counts,
            threshold: engine.threshold().snapshot(),
            stats: Some(stats),
            privacy: ReportPrivacy::default(),
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize reports as one JSON object per line.
pub fn to_json_lines(reports: &[SessionReport]) -> Result<String, serde_json::Error> {
    let lines = reports
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::ExpressionSample;
    use crate::config::Config;

    #[test]
    fn test_report_on_empty_engine() {
        let engine = MicroexpressionEngine::new(&Config::default());
        let builder = ReportBuilder::new().with_session_id("SESS-1".to_string());
        let report = builder.build(&engine);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.session_id.as_deref(), Some("SESS-1"));
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, builder.instance_id().to_string());
        assert!(report.pairs.is_empty());
        assert!(!report.privacy.contains_video);
        assert!((report.threshold.current - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_report_counts_samples() {
        let mut engine = MicroexpressionEngine::new(&Config::default());
        engine.push_sample(ExpressionSample::from_pairs(0, [("neutral", 0.9)]));

        let report = ReportBuilder::new().build(&engine);
        assert_eq!(report.stats.unwrap().samples_processed, 1);
    }

    #[test]
    fn test_json_lines() {
        let engine = MicroexpressionEngine::new(&Config::default());
        let builder = ReportBuilder::new();
        let reports = vec![builder.build(&engine), builder.build(&engine)];

        let jsonl = to_json_lines(&reports).unwrap();
        assert_eq!(jsonl.lines().count(), 2);

        let parsed: SessionReport = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.producer.name, PRODUCER_NAME);
    }
}
