// Emotion labels and their playlist profiles
//
// This module provides:
// - The closed set of 28 emotion labels in model output order
// - The static emotion -> playlist profile / search phrase table

pub mod profiles;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use profiles::{EmotionProfileTable, PlaylistProfile, DEFAULT_SEARCH_PHRASE};

/// Number of classes the emotion model emits.
pub const EMOTION_COUNT: usize = 28;

/// One of the 27 GoEmotions categories plus `neutral`.
///
/// Discriminants follow the model's output index order, so `label as usize`
/// is the logit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Admiration = 0,
    Amusement,
    Anger,
    Annoyance,
    Approval,
    Caring,
    Confusion,
    Curiosity,
    Desire,
    Disappointment,
    Disapproval,
    Disgust,
    Embarrassment,
    Excitement,
    Fear,
    Gratitude,
    Grief,
    Joy,
    Love,
    Nervousness,
    Optimism,
    Pride,
    Realization,
    Relief,
    Remorse,
    Sadness,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; EMOTION_COUNT] = [
        EmotionLabel::Admiration,
        EmotionLabel::Amusement,
        EmotionLabel::Anger,
        EmotionLabel::Annoyance,
        EmotionLabel::Approval,
        EmotionLabel::Caring,
        EmotionLabel::Confusion,
        EmotionLabel::Curiosity,
        EmotionLabel::Desire,
        EmotionLabel::Disappointment,
        EmotionLabel::Disapproval,
        EmotionLabel::Disgust,
        EmotionLabel::Embarrassment,
        EmotionLabel::Excitement,
        EmotionLabel::Fear,
        EmotionLabel::Gratitude,
        EmotionLabel::Grief,
        EmotionLabel::Joy,
        EmotionLabel::Love,
        EmotionLabel::Nervousness,
        EmotionLabel::Optimism,
        EmotionLabel::Pride,
        EmotionLabel::Realization,
        EmotionLabel::Relief,
        EmotionLabel::Remorse,
        EmotionLabel::Sadness,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    /// Map a model output index to its label. `None` past the last class.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Admiration => "admiration",
            EmotionLabel::Amusement => "amusement",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Annoyance => "annoyance",
            EmotionLabel::Approval => "approval",
            EmotionLabel::Caring => "caring",
            EmotionLabel::Confusion => "confusion",
            EmotionLabel::Curiosity => "curiosity",
            EmotionLabel::Desire => "desire",
            EmotionLabel::Disappointment => "disappointment",
            EmotionLabel::Disapproval => "disapproval",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Embarrassment => "embarrassment",
            EmotionLabel::Excitement => "excitement",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Gratitude => "gratitude",
            EmotionLabel::Grief => "grief",
            EmotionLabel::Joy => "joy",
            EmotionLabel::Love => "love",
            EmotionLabel::Nervousness => "nervousness",
            EmotionLabel::Optimism => "optimism",
            EmotionLabel::Pride => "pride",
            EmotionLabel::Realization => "realization",
            EmotionLabel::Relief => "relief",
            EmotionLabel::Remorse => "remorse",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Parse a label name, ignoring case and surrounding whitespace.
    /// Returns `None` for anything outside the closed set.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == normalized)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
