// Text -> emotion classification
//
// This module provides:
// - The `EmotionClassifier` capability consumed by the recommendation engine
// - An ONNX Runtime implementation backed by a pretrained transformer

mod onnx;

use thiserror::Error;

use crate::emotion::EmotionLabel;

pub use onnx::{ClassifierSettings, OnnxEmotionClassifier};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to load emotion model: {0}")]
    Load(String),

    #[error("Failed to tokenize input: {0}")]
    Tokenize(String),

    #[error("Emotion model inference failed: {0}")]
    Inference(String),

    #[error("Emotion model returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}

/// Assigns exactly one emotion label to a piece of text.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<EmotionLabel, ClassifierError>;
}
