//! Classifier label taxonomy and the canonical emotion mapping table.
//!
//! The expression classifier reports lower-case labels (`happy`, `sad`, ...).
//! Everything stored or displayed by the engine uses the canonical Ekman-style
//! names instead, each with a fixed display color.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A raw label as produced by the expression classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExpressionLabel {
    Angry,
    Disgusted,
    Fearful,
    Happy,
    Sad,
    Surprised,
    Neutral,
    /// Any label outside the classifier's known set
    Other(String),
}

impl ExpressionLabel {
    /// Parse a classifier label. Unknown labels pass through as `Other`.
    pub fn parse(label: &str) -> Self {
        match label {
            "angry" => ExpressionLabel::Angry,
            "disgusted" => ExpressionLabel::Disgusted,
            "fearful" => ExpressionLabel::Fearful,
            "happy" => ExpressionLabel::Happy,
            "sad" => ExpressionLabel::Sad,
            "surprised" => ExpressionLabel::Surprised,
            "neutral" => ExpressionLabel::Neutral,
            other => ExpressionLabel::Other(other.to_string()),
        }
    }

    /// The label as the classifier spells it.
    pub fn as_str(&self) -> &str {
        match self {
            ExpressionLabel::Angry => "angry",
            ExpressionLabel::Disgusted => "disgusted",
            ExpressionLabel::Fearful => "fearful",
            ExpressionLabel::Happy => "happy",
            ExpressionLabel::Sad => "sad",
            ExpressionLabel::Surprised => "surprised",
            ExpressionLabel::Neutral => "neutral",
            ExpressionLabel::Other(s) => s,
        }
    }

    /// Map this label onto the canonical taxonomy.
    pub fn canonical(&self) -> CanonicalEmotion {
        match self {
            ExpressionLabel::Angry => CanonicalEmotion::Anger,
            ExpressionLabel::Disgusted => CanonicalEmotion::Disgust,
            ExpressionLabel::Fearful => CanonicalEmotion::Fear,
            ExpressionLabel::Happy => CanonicalEmotion::Enjoyment,
            ExpressionLabel::Sad => CanonicalEmotion::Sadness,
            ExpressionLabel::Surprised => CanonicalEmotion::Surprise,
            ExpressionLabel::Neutral => CanonicalEmotion::Neutral,
            ExpressionLabel::Other(s) => CanonicalEmotion::Unmapped(s.to_uppercase()),
        }
    }
}

impl fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExpressionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpressionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(ExpressionLabel::parse(&label))
    }
}

/// Canonical emotion taxonomy (six basic emotions plus neutral).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalEmotion {
    Anger,
    Disgust,
    Fear,
    Enjoyment,
    Sadness,
    Surprise,
    Neutral,
    /// Upper-cased form of a label the table does not know
    Unmapped(String),
}

impl CanonicalEmotion {
    /// Display name, e.g. `ENJOYMENT`.
    pub fn name(&self) -> &str {
        match self {
            CanonicalEmotion::Anger => "ANGER",
            CanonicalEmotion::Disgust => "DISGUST",
            CanonicalEmotion::Fear => "FEAR",
            CanonicalEmotion::Enjoyment => "ENJOYMENT",
            CanonicalEmotion::Sadness => "SADNESS",
            CanonicalEmotion::Surprise => "SURPRISE",
            CanonicalEmotion::Neutral => "NEUTRAL",
            CanonicalEmotion::Unmapped(s) => s,
        }
    }

    /// Display color for this emotion. Unmapped labels render white.
    pub fn color(&self) -> DisplayColor {
        match self {
            CanonicalEmotion::Anger => DisplayColor::RED,
            CanonicalEmotion::Disgust => DisplayColor::DARK_MAGENTA,
            CanonicalEmotion::Fear => DisplayColor::PURPLE,
            CanonicalEmotion::Enjoyment => DisplayColor::YELLOW,
            CanonicalEmotion::Sadness => DisplayColor::BLUE,
            CanonicalEmotion::Surprise => DisplayColor::ORANGE,
            CanonicalEmotion::Neutral | CanonicalEmotion::Unmapped(_) => DisplayColor::WHITE,
        }
    }

    /// Parse a canonical name back into the taxonomy.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ANGER" => CanonicalEmotion::Anger,
            "DISGUST" => CanonicalEmotion::Disgust,
            "FEAR" => CanonicalEmotion::Fear,
            "ENJOYMENT" => CanonicalEmotion::Enjoyment,
            "SADNESS" => CanonicalEmotion::Sadness,
            "SURPRISE" => CanonicalEmotion::Surprise,
            "NEUTRAL" => CanonicalEmotion::Neutral,
            other => CanonicalEmotion::Unmapped(other.to_string()),
        }
    }
}

impl fmt::Display for CanonicalEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CanonicalEmotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for CanonicalEmotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CanonicalEmotion::from_name(&name))
    }
}

/// A hex display color (`#rrggbb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayColor(&'static str);

impl DisplayColor {
    pub const RED: DisplayColor = DisplayColor("#ff0000");
    pub const DARK_MAGENTA: DisplayColor = DisplayColor("#8b008b");
    pub const PURPLE: DisplayColor = DisplayColor("#800080");
    pub const YELLOW: DisplayColor = DisplayColor("#ffff00");
    pub const BLUE: DisplayColor = DisplayColor("#0000ff");
    pub const ORANGE: DisplayColor = DisplayColor("#ffa500");
    pub const WHITE: DisplayColor = DisplayColor("#ffffff");
}

impl fmt::Display for DisplayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for DisplayColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}
