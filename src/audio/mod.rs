//! Audio plumbing: WAV decode, resampling, and microphone capture.

pub mod capture;
pub mod loader;
pub mod resampler;

pub use capture::{
    get_device, list_input_devices, record_clip, select_input_config, AudioDevice, RecordedClip,
};
pub use loader::{decode_wav, load_wav};
pub use resampler::{resample_buffer, AudioResampler, ANALYSIS_SAMPLE_RATE};

use thiserror::Error;

/// Errors from the audio layer
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio capture failed: {0}")]
    Capture(String),
}
