//! WAV file loading.

use hound::WavReader;
use std::path::Path;
use tracing::debug;

use super::resampler::{resample_buffer, ANALYSIS_SAMPLE_RATE};
use super::AudioError;

/// Decode a WAV file into mono f32 samples at the file's native rate.
///
/// Integer samples are scaled to [-1.0, 1.0]; multi-channel audio is
/// averaged down to mono.
pub fn decode_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32), AudioError> {
    let path = path.as_ref();
    let reader =
        WavReader::open(path).map_err(|e| AudioError::Decode(format!("{:?}: {}", path, e)))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Decode(format!("Failed to read samples: {}", e)))?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1u32 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AudioError::Decode(format!("Failed to read samples: {}", e)))?
        }
    };

    debug!(
        "Decoded {:?}: {} Hz, {} channels, {} frames",
        path,
        sample_rate,
        channels,
        samples.len() / channels.max(1)
    );

    Ok((to_mono(&samples, channels), sample_rate))
}

/// Load a WAV file as mono f32 samples at the 22.05kHz analysis rate.
pub fn load_wav(path: impl AsRef<Path>) -> Result<Vec<f32>, AudioError> {
    let (samples, sample_rate) = decode_wav(path)?;
    if sample_rate == ANALYSIS_SAMPLE_RATE {
        Ok(samples)
    } else {
        resample_buffer(&samples, sample_rate)
    }
}

/// Average interleaved channels down to mono.
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}
