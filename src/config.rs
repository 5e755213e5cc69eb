//! Configuration for the Synheart Microexpression engine.

use crate::core::buffer::DEFAULT_WINDOW_CAPACITY;
use crate::core::light::DEFAULT_LOW_LIGHT_CUTOFF;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the engine and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames kept in the sliding window
    pub window_capacity: usize,

    /// Pattern detector limits
    pub detection: DetectionConfig,

    /// Composite score shape
    pub scoring: ScoringConfig,

    /// Adaptive threshold bounds and rules
    pub threshold: ThresholdConfig,

    /// Speech correlation settings
    pub matching: MatchingConfig,

    /// Brightness below which the scene counts as low light (0-255)
    pub low_light_cutoff: f64,

    /// Classifier status turns stale when no sample arrives for this long
    pub classifier_stale_after_ms: i64,

    /// Pairs shown in live output
    pub display_limit: usize,

    /// Path for exporting session reports
    pub export_path: PathBuf,

    /// Path for storing transparency logs
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-microexpression");

        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            detection: DetectionConfig::default(),
            scoring: ScoringConfig::default(),
            threshold: ThresholdConfig::default(),
            matching: MatchingConfig::default(),
            low_light_cutoff: DEFAULT_LOW_LIGHT_CUTOFF,
            classifier_stale_after_ms: 2_000,
            display_limit: 10,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-microexpression")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.threshold;
        if !(t.min.is_finite() && t.max.is_finite() && t.initial.is_finite()) {
            return Err(ConfigError::Invalid("threshold values must be finite".into()));
        }
        if t.min > t.max {
            return Err(ConfigError::Invalid(format!(
                "threshold min {} exceeds max {}",
                t.min, t.max
            )));
        }
        if t.initial < t.min || t.initial > t.max {
            return Err(ConfigError::Invalid(format!(
                "initial threshold {} outside [{}, {}]",
                t.initial, t.min, t.max
            )));
        }
        if t.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be positive".into()));
        }
        if self.window_capacity < self.detection.min_samples.max(5) {
            return Err(ConfigError::Invalid(format!(
                "window_capacity {} cannot hold {} samples",
                self.window_capacity,
                self.detection.min_samples.max(5)
            )));
        }
        if self.detection.min_duration_ms > self.detection.max_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "min_duration_ms {} exceeds max_duration_ms {}",
                self.detection.min_duration_ms, self.detection.max_duration_ms
            )));
        }
        Ok(())
    }
}

/// Pattern detector limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Frames required before the detector runs
    pub min_samples: usize,
    /// Shortest accepted transition (start to return)
    pub min_duration_ms: i64,
    /// Longest accepted transition
    pub max_duration_ms: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            min_duration_ms: 40,  // 1/25 s
            max_duration_ms: 200, // 1/5 s
        }
    }
}

/// Shape of the duration factor in the composite score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Duration scoring 1.0
    pub ideal_duration_ms: f64,
    /// Distance from the ideal at which the factor reaches 0
    pub duration_tolerance_ms: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ideal_duration_ms: 100.0,
            duration_tolerance_ms: 100.0,
        }
    }
}

/// Adaptive threshold settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    /// Step applied by the rate rules and missed-detection reports
    pub adjustment_rate: f64,
    /// Extra decrease applied on every adjustment in low light
    pub low_light_penalty: f64,
    /// Feedback outcomes kept for the rates
    pub history_capacity: usize,
    /// Raise the threshold above this false positive rate
    pub false_positive_ceiling: f64,
    /// Lower it when the true positive rate is below this...
    pub true_positive_floor: f64,
    /// ...and the false positive rate is below this
    pub false_positive_floor: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            initial: 0.65,
            min: 0.4,
            max: 0.9,
            adjustment_rate: 0.05,
            low_light_penalty: 0.05,
            history_capacity: 20,
            false_positive_ceiling: 0.2,
            true_positive_floor: 0.5,
            false_positive_floor: 0.1,
        }
    }
}

/// Speech correlation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Expected lag of the speech engine behind the camera
    pub speech_delay_ms: i64,
    /// Identical emotion/word pairs closer than this collapse into one
    pub dedup_window_ms: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            speech_delay_ms: 500,
            dedup_window_ms: 2_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
