//! Offline speech emotion recognition.
//!
//! Takes a short speech clip (a WAV file or a live microphone capture),
//! extracts 40 mean Mel-frequency cepstral coefficients, and classifies
//! them into one of eight emotion categories with a pretrained ONNX model.
//!
//! The pipeline is synchronous and request-scoped: decode/capture →
//! extract → predict, with transient audio deleted when its owning guard
//! drops.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod features;
pub mod session;

pub use audio::{AudioError, RecordedClip};
pub use classifier::{
    ClassifierConfig, ClassifierError, EmotionClassifier, EmotionLabel, LabelSet, Prediction,
};
pub use config::Config;
pub use features::{extract_features, FeatureError, MfccExtractor, FEATURE_DIM};
pub use session::{predict_recording, predict_wav, SessionError, TempClip};
