//! Acoustic feature extraction: the MFCC front end.
//!
//! Converts a speech clip into the fixed-size feature matrix consumed by the
//! emotion classifier: a 128-band log-mel spectrogram reduced to 40 cepstral
//! coefficients and averaged over time.

pub mod mel;
pub mod mfcc;

pub use mel::{MelConfig, MelSpectrogram};
pub use mfcc::{
    extract_features, MfccExtractor, FEATURE_DIM, SEGMENT_DURATION_SECS, SEGMENT_OFFSET_SECS,
};

use crate::audio::AudioError;
use thiserror::Error;

/// Errors from feature extraction
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Analysis segment contains no samples")]
    EmptySignal,

    #[error("Spectrogram computation failed: {0}")]
    Spectrogram(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}
