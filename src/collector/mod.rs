//! Input collection for the Synheart Microexpression engine.
//!
//! This module defines the boundary types the external classifier, speech
//! engine and light sampler produce, and a collector that reads them as
//! line-delimited JSON.

pub mod stream;
pub mod types;

// Re-export commonly used types
pub use stream::{parse_line, CollectorConfig, CollectorError, InputSource, StreamCollector};
pub use types::{
    ExpressionSample, Feedback, FeedbackEvent, InputEvent, LightSample, SampleError,
    TranscriptFragment,
};
