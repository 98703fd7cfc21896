//! MFCC extraction: the feature vector handed to the classifier.

use ndarray::{Array1, Array2, Axis};
use std::f32::consts::PI;
use std::path::Path;
use tracing::debug;

use super::mel::{MelConfig, MelSpectrogram};
use super::FeatureError;
use crate::audio::load_wav;

/// Number of cepstral coefficients in a feature vector
pub const FEATURE_DIM: usize = 40;

/// Where the analysis segment starts, in seconds from clip start
pub const SEGMENT_OFFSET_SECS: f32 = 0.5;

/// Maximum analysis segment length in seconds
pub const SEGMENT_DURATION_SECS: f32 = 2.5;

/// MFCC extractor with pre-computed DCT basis and mel front end
pub struct MfccExtractor {
    mel: MelSpectrogram,
    dct_basis: Vec<Vec<f32>>,
}

impl MfccExtractor {
    pub fn new(config: MelConfig) -> Result<Self, FeatureError> {
        if config.n_mels < FEATURE_DIM {
            return Err(FeatureError::Spectrogram(format!(
                "n_mels ({}) must be at least {}",
                config.n_mels, FEATURE_DIM
            )));
        }

        let dct_basis = dct_ii_basis(FEATURE_DIM, config.n_mels);
        let mel = MelSpectrogram::new(config)?;

        Ok(Self { mel, dct_basis })
    }

    pub fn with_defaults() -> Result<Self, FeatureError> {
        Self::new(MelConfig::default())
    }

    /// Extract the `(1, 40)` feature matrix from mono 22.05kHz samples.
    ///
    /// Analyzes the segment from 0.5s up to 3.0s into the clip; shorter
    /// clips are analyzed as far as they reach. A clip that ends before the
    /// offset fails with `EmptySignal`.
    pub fn extract(&mut self, samples: &[f32]) -> Result<Array2<f32>, FeatureError> {
        let segment = analysis_segment(samples, self.mel.sample_rate());
        if segment.is_empty() {
            return Err(FeatureError::EmptySignal);
        }

        let mel_db = self.mel.compute(segment)?;
        let n_frames = mel_db.len();

        // DCT-II per frame, accumulated into a running mean
        let mut mean = vec![0.0f64; FEATURE_DIM];
        for frame in &mel_db {
            for (k, basis) in self.dct_basis.iter().enumerate() {
                let coeff: f32 = basis.iter().zip(frame.iter()).map(|(b, m)| b * m).sum();
                mean[k] += coeff as f64;
            }
        }

        let inv = 1.0 / n_frames as f64;
        let mfccs: Vec<f32> = mean.into_iter().map(|v| (v * inv) as f32).collect();

        debug!(
            "Extracted {} mean MFCCs from {} frames ({} samples)",
            FEATURE_DIM,
            n_frames,
            segment.len()
        );

        Ok(Array1::from(mfccs).insert_axis(Axis(0)))
    }
}

/// Extract the feature matrix from an audio file on disk.
///
/// Decodes the file (any rate/channel layout hound accepts), resamples to
/// 22.05kHz mono, and runs the MFCC front end. The returned matrix has no
/// further dependency on the file.
pub fn extract_features(path: impl AsRef<Path>) -> Result<Array2<f32>, FeatureError> {
    let samples = load_wav(path)?;
    let mut extractor = MfccExtractor::with_defaults()?;
    extractor.extract(&samples)
}

/// Select the analysis segment: up to 2.5s starting 0.5s into the clip.
fn analysis_segment(samples: &[f32], sample_rate: u32) -> &[f32] {
    let start = (SEGMENT_OFFSET_SECS * sample_rate as f32).round() as usize;
    if start >= samples.len() {
        return &[];
    }
    let len = (SEGMENT_DURATION_SECS * sample_rate as f32).round() as usize;
    let end = (start + len).min(samples.len());
    &samples[start..end]
}

/// Orthonormal DCT-II basis: `n_coeffs` rows over `n_input` points.
fn dct_ii_basis(n_coeffs: usize, n_input: usize) -> Vec<Vec<f32>> {
    let norm0 = (1.0 / n_input as f32).sqrt();
    let norm = (2.0 / n_input as f32).sqrt();

    (0..n_coeffs)
        .map(|k| {
            let scale = if k == 0 { norm0 } else { norm };
            (0..n_input)
                .map(|n| scale * (PI * (n as f32 + 0.5) * k as f32 / n_input as f32).cos())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;

    fn sine(freq: f32, secs: f32) -> Vec<f32> {
        let n = (secs * SR as f32) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / SR as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_segment_of_long_clip_is_capped() {
        let samples = vec![0.0f32; 4 * SR as usize];
        let segment = analysis_segment(&samples, SR);
        assert_eq!(segment.len(), (2.5 * SR as f32).round() as usize);
    }

    #[test]
    fn test_segment_of_one_second_clip() {
        let samples = vec![0.0f32; SR as usize];
        let segment = analysis_segment(&samples, SR);
        // 0.5s offset leaves 0.5s of signal
        assert_eq!(segment.len(), SR as usize - 11025);
    }

    #[test]
    fn test_segment_of_too_short_clip_is_empty() {
        let samples = vec![0.0f32; 8000]; // ~0.36s
        assert!(analysis_segment(&samples, SR).is_empty());
    }

    #[test]
    fn test_dct_basis_constant_input() {
        let basis = dct_ii_basis(FEATURE_DIM, 128);
        let constant = vec![1.0f32; 128];

        // A constant signal projects entirely onto coefficient 0
        let c0: f32 = basis[0].iter().zip(constant.iter()).map(|(b, m)| b * m).sum();
        assert!((c0 - 128.0f32.sqrt()).abs() < 1e-3);

        for (k, row) in basis.iter().enumerate().skip(1) {
            let ck: f32 = row.iter().zip(constant.iter()).map(|(b, m)| b * m).sum();
            assert!(ck.abs() < 1e-3, "Coefficient {} not ~0: {}", k, ck);
        }
    }

    #[test]
    fn test_extract_shape_contract() {
        let mut extractor = MfccExtractor::with_defaults().unwrap();
        let features = extractor.extract(&sine(440.0, 4.0)).unwrap();
        assert_eq!(features.dim(), (1, FEATURE_DIM));
    }

    #[test]
    fn test_extract_short_but_nonempty_clip() {
        let mut extractor = MfccExtractor::with_defaults().unwrap();
        let features = extractor.extract(&sine(440.0, 1.0)).unwrap();
        assert_eq!(features.dim(), (1, FEATURE_DIM));
    }

    #[test]
    fn test_extract_rejects_empty_segment() {
        let mut extractor = MfccExtractor::with_defaults().unwrap();
        let result = extractor.extract(&sine(440.0, 0.4));
        assert!(matches!(result, Err(FeatureError::EmptySignal)));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let samples = sine(220.0, 3.5);
        let mut extractor = MfccExtractor::with_defaults().unwrap();
        let a = extractor.extract(&samples).unwrap();
        let b = extractor.extract(&samples).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_silence_baseline() {
        let mut extractor = MfccExtractor::with_defaults().unwrap();
        let samples = vec![0.0f32; 3 * SR as usize];
        let features = extractor.extract(&samples).unwrap();

        assert_eq!(features.dim(), (1, FEATURE_DIM));
        assert!(features.iter().all(|v| v.is_finite()));

        // All bands sit at the -100dB log floor, so only coefficient 0 is
        // non-zero: -100 * sqrt(128)
        let expected_c0 = -100.0 * 128.0f32.sqrt();
        assert!((features[[0, 0]] - expected_c0).abs() < 0.5);
        for k in 1..FEATURE_DIM {
            assert!(features[[0, k]].abs() < 0.1, "Coefficient {} off baseline", k);
        }
    }
}
