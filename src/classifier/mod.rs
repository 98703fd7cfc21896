//! Emotion classification over a pretrained ONNX artifact.
//!
//! The adapter loads the model once at startup and exposes a synchronous
//! predict call: a `(1, 40)` feature matrix in, one of eight emotion labels
//! out. The label order is a versioned contract persisted next to the model
//! artifact (see [`labels`]).

pub mod labels;
pub mod provider;

pub use labels::{EmotionLabel, LabelSet, EMOTION_LABEL_COUNT};
pub use provider::{ClassifierConfig, EmotionClassifier, Prediction};

use thiserror::Error;

/// Errors from the classifier adapter
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Feature shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 2],
        actual: [usize; 2],
    },

    #[error("Invalid label set: {0}")]
    LabelSet(String),

    #[error("Inference error: {0}")]
    Inference(String),
}
