//! Synheart Microexpression - microexpression detection and speech correlation.
//!
//! This library turns a live stream of per-frame facial-expression
//! classifications into discrete microexpression events and pairs each one
//! with the word being spoken at the time.
//!
//! # Privacy Guarantees
//!
//! - **No video**: Only classifier scores and scalar brightness are accepted
//! - **No audio**: Only finalized transcript text arrives, and only the latest
//!   two words are kept
//! - **Bounded raw data**: Classifier samples live only in a two-second window
//! - **Transparency**: All processing is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                 Synheart Microexpression Engine                  │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐  │
//! │  │ Classifier │──▶│  Sliding   │──▶│  Pattern   │──▶│ Scorer  │  │
//! │  │  samples   │   │  window    │   │  detector  │   │         │  │
//! │  └────────────┘   └────────────┘   └────────────┘   └────┬────┘  │
//! │                                                          ▼       │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐  │
//! │  │ Transcript │──▶│   Speech   │◀──│ Threshold  │◀──│  Gate   │  │
//! │  │ fragments  │   │  matcher   │   │  manager   │   │         │  │
//! │  └────────────┘   └─────┬──────┘   └─────▲──────┘   └─────────┘  │
//! │                         ▼                │                       │
//! │                  Emotion-word pairs   Feedback / light           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use synheart_microexpression::{Config, ExpressionSample, MicroexpressionEngine};
//!
//! let mut engine = MicroexpressionEngine::new(&Config::default());
//! engine.push_word("honestly");
//!
//! let events = engine.push_sample(ExpressionSample::from_pairs(0, [("neutral", 0.9)]));
//! assert_eq!(events.len(), 1); // live emotion only
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod transparency;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use collector::{
    CollectorConfig, CollectorError, ExpressionSample, Feedback, InputEvent, InputSource,
    LightSample, StreamCollector,
};
pub use config::{Config, ConfigError};
pub use crate::core::{
    CanonicalEmotion, ClassifierStatus, EmotionWordPair, EngineEvent, ManualClock,
    MicroexpressionEngine, ReportBuilder, SessionReport,
};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║        SYNHEART MICROEXPRESSION - PRIVACY DECLARATION            ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This engine correlates facial expressions with speech for       ║
║  research.                                                       ║
║                                                                  ║
║  ✓ WHAT WE PROCESS:                                              ║
║    • Expression classifier scores per frame                      ║
║    • Finalized speech transcript fragments                       ║
║    • Average scene brightness                                    ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Video frames or images of your face                         ║
║    • Audio recordings                                            ║
║    • Full transcripts (only the word matched to a detection)     ║
║                                                                  ║
║  All data is processed locally. Classifier scores are discarded  ║
║  after two seconds.                                              ║
║                                                                  ║
║  You can view processing statistics anytime with:                ║
║    synheart-micro status                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER CAPTURE"));
        assert!(PRIVACY_DECLARATION.contains("Audio recordings"));
    }
}
