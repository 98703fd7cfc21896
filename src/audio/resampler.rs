use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use super::AudioError;

/// Sample rate all analysis runs at
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Audio resampler wrapper for converting a source sample rate to 22.05kHz
pub struct AudioResampler {
    resampler: FftFixedIn<f32>,
    input_buffer: Vec<Vec<f32>>,
    output_buffer: Vec<Vec<f32>>,
    input_frames: usize,
}

impl AudioResampler {
    /// Create a new resampler from the source sample rate to 22.05kHz
    pub fn new(source_sample_rate: u32) -> Result<Self, AudioError> {
        let ratio = ANALYSIS_SAMPLE_RATE as f64 / source_sample_rate as f64;

        debug!(
            "Creating resampler: {} Hz -> {} Hz (ratio: {:.4})",
            source_sample_rate, ANALYSIS_SAMPLE_RATE, ratio
        );

        // Use 1024 input frames as a reasonable chunk size
        let input_frames = 1024;
        let channels = 1; // Mono

        let resampler = FftFixedIn::new(
            source_sample_rate as usize,
            ANALYSIS_SAMPLE_RATE as usize,
            input_frames,
            2, // sub_chunks for quality
            channels,
        )
        .map_err(|e| AudioError::Resample(e.to_string()))?;

        // Pre-allocate buffers
        let input_buffer = vec![vec![0.0f32; input_frames]; channels];
        let output_buffer = resampler.output_buffer_allocate(true);

        Ok(Self {
            resampler,
            input_buffer,
            output_buffer,
            input_frames,
        })
    }

    /// Get the number of input frames needed for the next process call
    pub fn input_frames_next(&self) -> usize {
        self.input_frames
    }

    /// Output frames to discard before the first valid sample
    pub fn output_delay(&self) -> usize {
        self.resampler.output_delay()
    }

    /// Process input samples and return resampled output
    ///
    /// Input must be exactly `input_frames_next()` samples.
    /// Returns resampled samples at 22.05kHz.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, AudioError> {
        if input.len() != self.input_frames {
            return Err(AudioError::Resample(format!(
                "Input length {} doesn't match expected {}",
                input.len(),
                self.input_frames
            )));
        }

        // Copy input to buffer
        self.input_buffer[0].copy_from_slice(input);

        // Process
        let (_, output_frames) = self
            .resampler
            .process_into_buffer(&self.input_buffer, &mut self.output_buffer, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

        // Extract output
        Ok(self.output_buffer[0][..output_frames].to_vec())
    }

    /// Reset the resampler state
    pub fn reset(&mut self) {
        self.resampler.reset();
    }
}

/// Resample a whole clip to 22.05kHz.
///
/// Drives the streaming resampler over the buffer, zero-padding the tail
/// chunk and compensating for the FFT resampler's latency, then trims the
/// output to the expected length.
pub fn resample_buffer(samples: &[f32], source_sample_rate: u32) -> Result<Vec<f32>, AudioError> {
    if source_sample_rate == ANALYSIS_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let mut resampler = AudioResampler::new(source_sample_rate)?;
    let chunk_size = resampler.input_frames_next();
    let delay = resampler.output_delay();

    let expected =
        (samples.len() as f64 * ANALYSIS_SAMPLE_RATE as f64 / source_sample_rate as f64).round()
            as usize;

    // Pad with silence so the latency tail is flushed through
    let mut padded = samples.to_vec();
    padded.resize(samples.len() + 2 * chunk_size, 0.0);

    let mut output = Vec::with_capacity(expected + chunk_size);
    let mut scratch = vec![0.0f32; chunk_size];

    for block in padded.chunks(chunk_size) {
        let resampled = if block.len() == chunk_size {
            resampler.process(block)?
        } else {
            scratch.fill(0.0);
            scratch[..block.len()].copy_from_slice(block);
            resampler.process(&scratch)?
        };
        output.extend_from_slice(&resampled);
    }

    if output.len() > delay {
        output.drain(..delay);
    }
    output.truncate(expected);

    Ok(output)
}
