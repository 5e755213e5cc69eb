//! Transparency module for the Synheart Microexpression engine.
//!
//! This module tracks what the engine processed, supporting participant
//! trust and research ethics review.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
