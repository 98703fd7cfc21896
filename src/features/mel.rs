//! Log-mel spectrogram generation.
//!
//! Centered, Hann-windowed power STFT through a Slaney-scale mel filterbank,
//! converted to decibels with an 80dB floor below the segment maximum.

use realfft::{RealFftPlanner, RealToComplex};
use std::f32::consts::PI;
use std::sync::Arc;

use super::FeatureError;

/// Configuration for mel spectrogram generation
#[derive(Debug, Clone)]
pub struct MelConfig {
    /// Sample rate of input audio
    pub sample_rate: u32,

    /// FFT size
    pub n_fft: usize,

    /// Hop length between frames (in samples)
    pub hop_length: usize,

    /// Number of mel frequency bands
    pub n_mels: usize,

    /// Minimum frequency for mel filterbank (Hz)
    pub fmin: f32,

    /// Maximum frequency for mel filterbank (Hz)
    pub fmax: f32,

    /// Power floor before the log (numerical stability)
    pub amin: f32,

    /// Dynamic range below the segment maximum, in dB
    pub top_db: f32,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: 11025.0,
            amin: 1e-10,
            top_db: 80.0,
        }
    }
}

/// Mel spectrogram generator with pre-computed filterbank and FFT plan
pub struct MelSpectrogram {
    config: MelConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    filterbank: Vec<Vec<f32>>,
    window: Vec<f32>,
    // Pre-allocated buffers
    fft_input: Vec<f32>,
    fft_output: Vec<realfft::num_complex::Complex<f32>>,
}

impl MelSpectrogram {
    /// Create a new generator with the given configuration
    pub fn new(config: MelConfig) -> Result<Self, FeatureError> {
        if config.n_fft == 0 || config.hop_length == 0 || config.n_mels == 0 {
            return Err(FeatureError::Spectrogram(
                "n_fft, hop_length and n_mels must be non-zero".to_string(),
            ));
        }

        let window = hann_window(config.n_fft);

        let filterbank = create_mel_filterbank(
            config.n_mels,
            config.n_fft,
            config.sample_rate as f32,
            config.fmin,
            config.fmax,
        );

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.n_fft);

        let fft_input = vec![0.0f32; config.n_fft];
        let fft_output = vec![realfft::num_complex::Complex::new(0.0, 0.0); config.n_fft / 2 + 1];

        Ok(Self {
            config,
            fft,
            filterbank,
            window,
            fft_input,
            fft_output,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn n_mels(&self) -> usize {
        self.config.n_mels
    }

    /// Compute the log-mel spectrogram in dB.
    ///
    /// Frames are centered: the signal is reflect-padded by n_fft/2 on both
    /// sides, so any non-empty input yields at least one frame.
    ///
    /// # Returns
    /// `Vec<Vec<f32>>` where the outer dim is time frames and the inner dim
    /// is mel bands.
    pub fn compute(&mut self, samples: &[f32]) -> Result<Vec<Vec<f32>>, FeatureError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptySignal);
        }

        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = (n_fft / 2) as isize;
        let n = samples.len() as isize;
        let n_frames = samples.len() / hop + 1;

        let mut mel_spec = Vec::with_capacity(n_frames);

        for frame_idx in 0..n_frames {
            // Window centered on frame_idx * hop_length
            let start = frame_idx as isize * hop as isize - pad;

            for (i, slot) in self.fft_input.iter_mut().enumerate() {
                let mut idx = start + i as isize;
                // Out-of-range samples are taken by reflection
                if idx < 0 {
                    idx = -idx;
                }
                if idx >= n {
                    idx = 2 * n - idx - 2;
                }
                *slot = if idx >= 0 && idx < n {
                    samples[idx as usize] * self.window[i]
                } else {
                    0.0
                };
            }

            self.fft
                .process(&mut self.fft_input, &mut self.fft_output)
                .map_err(|e| FeatureError::Spectrogram(format!("FFT failed: {}", e)))?;

            // Power spectrum through the mel filterbank
            let mel_frame: Vec<f32> = self
                .filterbank
                .iter()
                .map(|filter| {
                    filter
                        .iter()
                        .zip(self.fft_output.iter())
                        .map(|(f, c)| f * (c.re * c.re + c.im * c.im))
                        .sum()
                })
                .collect();

            mel_spec.push(mel_frame);
        }

        Ok(self.power_to_db(mel_spec))
    }

    /// Convert mel power to dB, clamped to `top_db` below the maximum.
    fn power_to_db(&self, mut mel_spec: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
        let amin = self.config.amin;

        for frame in mel_spec.iter_mut() {
            for v in frame.iter_mut() {
                *v = 10.0 * v.max(amin).log10();
            }
        }

        let max_db = mel_spec
            .iter()
            .flat_map(|frame| frame.iter())
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = max_db - self.config.top_db;

        for frame in mel_spec.iter_mut() {
            for v in frame.iter_mut() {
                *v = v.max(floor);
            }
        }

        mel_spec
    }
}

/// Periodic Hann window
fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / length as f32).cos()))
        .collect()
}

/// Convert frequency to Slaney mel scale (linear below 1kHz, log above)
fn hz_to_mel(hz: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;

    if hz >= min_log_hz {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    } else {
        hz / f_sp
    }
}

/// Convert Slaney mel scale to frequency
fn mel_to_hz(mel: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;

    if mel >= min_log_mel {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    } else {
        f_sp * mel
    }
}

/// Create a Slaney-normalized mel filterbank.
///
/// # Returns
/// `n_mels` triangular filters, each over `n_fft/2 + 1` FFT bins.
fn create_mel_filterbank(
    n_mels: usize,
    n_fft: usize,
    sample_rate: f32,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let n_freqs = n_fft / 2 + 1;

    let fft_freqs: Vec<f32> = (0..n_freqs)
        .map(|i| i as f32 * sample_rate / n_fft as f32)
        .collect();

    // n_mels + 2 equally spaced points in mel scale
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let hz_points: Vec<f32> = (0..=n_mels + 1)
        .map(|i| mel_to_hz(mel_min + i as f32 * (mel_max - mel_min) / (n_mels + 1) as f32))
        .collect();

    let mut filterbank = vec![vec![0.0f32; n_freqs]; n_mels];

    for m in 0..n_mels {
        let f_left = hz_points[m];
        let f_center = hz_points[m + 1];
        let f_right = hz_points[m + 2];

        // Slaney normalization: each filter integrates to the same area
        let enorm = 2.0 / (f_right - f_left);

        for (k, &freq) in fft_freqs.iter().enumerate() {
            if freq >= f_left && freq < f_center {
                // Rising slope
                filterbank[m][k] = enorm * (freq - f_left) / (f_center - f_left);
            } else if freq >= f_center && freq <= f_right {
                // Falling slope
                filterbank[m][k] = enorm * (f_right - freq) / (f_right - f_center);
            }
        }
    }

    filterbank
}
