//! Request-scoped prediction pipeline.
//!
//! Each user action (upload-predict, record-predict) runs to completion
//! inside one request scope. Transition order is enforced by ownership: a
//! clip must exist before it can be persisted, a persisted clip before it
//! can be analyzed, and the temp file is released when its guard drops,
//! never while extraction still borrows it. Nothing survives the request.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::{AudioError, RecordedClip};
use crate::classifier::{ClassifierError, EmotionClassifier, Prediction};
use crate::features::{extract_features, FeatureError};

/// Errors from a prediction request
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// A transient audio clip on disk, deleted when the guard drops.
///
/// Deletion is best-effort: a failure is logged as a warning and never
/// blocks the prediction flow.
#[derive(Debug)]
pub struct TempClip {
    path: PathBuf,
}

impl TempClip {
    /// Persist captured samples as a 16-bit PCM WAV in the temp directory.
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Result<Self, AudioError> {
        let path = reserve_temp_path()?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| AudioError::Capture(format!("Failed to create temp WAV: {}", e)))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer
                .write_sample(value)
                .map_err(|e| AudioError::Capture(format!("Failed to write temp WAV: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Capture(format!("Failed to finalize temp WAV: {}", e)))?;

        debug!("Persisted {} samples to {:?}", samples.len(), path);
        Ok(Self { path })
    }

    /// Persist an uploaded WAV byte stream to the temp directory.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let path = reserve_temp_path()?;
        std::fs::write(&path, bytes)
            .map_err(|e| AudioError::Capture(format!("Failed to write temp WAV: {}", e)))?;

        debug!("Persisted {} uploaded bytes to {:?}", bytes.len(), path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempClip {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Couldn't delete temp clip {:?}: {}", self.path, e);
            }
        }
    }
}

/// Reserve a unique `.wav` path in the temp directory.
fn reserve_temp_path() -> Result<PathBuf, AudioError> {
    let file = tempfile::Builder::new()
        .prefix("emotion-clip-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| AudioError::Capture(format!("Failed to create temp file: {}", e)))?;

    // Disarm tempfile's silent auto-delete; TempClip owns cleanup from here
    file.into_temp_path()
        .keep()
        .map_err(|e| AudioError::Capture(format!("Failed to reserve temp path: {}", e)))
}

/// Predict the emotion of a WAV file on disk.
pub fn predict_wav(
    path: impl AsRef<Path>,
    classifier: &mut EmotionClassifier,
) -> Result<Prediction, SessionError> {
    let features = extract_features(path)?;
    let prediction = classifier.predict(&features)?;

    info!(
        "Predicted emotion: {} (score {:.3})",
        prediction.label,
        prediction.score()
    );
    Ok(prediction)
}

/// Predict the emotion of a captured clip.
///
/// The clip is persisted to a temp WAV, analyzed, and the temp file is
/// released before inference runs, matching the transient-clip lifecycle:
/// the feature matrix has no remaining dependency on the file.
pub fn predict_recording(
    clip: RecordedClip,
    classifier: &mut EmotionClassifier,
) -> Result<Prediction, SessionError> {
    let temp = TempClip::from_samples(&clip.samples, clip.sample_rate)?;
    let features = extract_features(temp.path())?;
    drop(temp);

    let prediction = classifier.predict(&features)?;

    info!(
        "Predicted emotion: {} (score {:.3})",
        prediction.label,
        prediction.score()
    );
    Ok(prediction)
}
