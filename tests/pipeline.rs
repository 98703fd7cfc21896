//! End-to-end feature extraction over generated WAV fixtures.
//!
//! These exercise the decode → resample → segment → MFCC path without a
//! model artifact; the classifier contract is covered by unit tests.

use emotion_cli::audio::AudioError;
use emotion_cli::features::{extract_features, FeatureError, FEATURE_DIM};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;
use tempfile::tempdir;

fn write_sine_wav(path: &Path, freq: f32, secs: f32, sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let frames = (secs * sample_rate as f32) as usize;
    for i in 0..frames {
        let value = ((2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 16000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn write_silence_wav(path: &Path, secs: f32, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..(secs * sample_rate as f32) as usize {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn long_clip_yields_one_by_forty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("speechlike.wav");
    write_sine_wav(&path, 220.0, 4.0, 22050, 1);

    let features = extract_features(&path).unwrap();
    assert_eq!(features.dim(), (1, FEATURE_DIM));
    assert!(features.iter().all(|v| v.is_finite()));
}

#[test]
fn repeated_extraction_is_deterministic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixed.wav");
    write_sine_wav(&path, 330.0, 3.5, 22050, 1);

    let a = extract_features(&path).unwrap();
    let b = extract_features(&path).unwrap();
    assert_eq!(a, b);
}

#[test]
fn foreign_rate_and_stereo_are_normalized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stereo48k.wav");
    write_sine_wav(&path, 440.0, 4.0, 48000, 2);

    let features = extract_features(&path).unwrap();
    assert_eq!(features.dim(), (1, FEATURE_DIM));
}

#[test]
fn silence_extracts_to_fixed_baseline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    write_silence_wav(&path, 3.0, 22050);

    let features = extract_features(&path).unwrap();
    assert_eq!(features.dim(), (1, FEATURE_DIM));
    assert!(features.iter().all(|v| v.is_finite()));

    // Silence lands every band on the log floor: only coefficient 0 survives
    assert!(features[[0, 0]] < -1000.0);
    for k in 1..FEATURE_DIM {
        assert!(features[[0, k]].abs() < 0.1);
    }
}

#[test]
fn clip_shorter_than_offset_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blip.wav");
    write_sine_wav(&path, 440.0, 0.3, 22050, 1);

    let result = extract_features(&path);
    assert!(matches!(result, Err(FeatureError::EmptySignal)));
}

#[test]
fn one_second_clip_still_satisfies_the_shape_contract() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.wav");
    write_sine_wav(&path, 440.0, 1.0, 22050, 1);

    let features = extract_features(&path).unwrap();
    assert_eq!(features.dim(), (1, FEATURE_DIM));
}

#[test]
fn corrupt_file_fails_with_decode_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"RIFFnope, not audio at all").unwrap();

    let result = extract_features(&path);
    assert!(matches!(
        result,
        Err(FeatureError::Audio(AudioError::Decode(_)))
    ));
}

#[test]
fn missing_file_fails_with_decode_error() {
    let result = extract_features("/nonexistent/clip.wav");
    assert!(matches!(
        result,
        Err(FeatureError::Audio(AudioError::Decode(_)))
    ));
}

#[test]
fn features_are_independent_of_the_source_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ephemeral.wav");
    write_sine_wav(&path, 550.0, 4.0, 22050, 1);

    let features = extract_features(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    // The matrix is a value, not a view over the file
    assert_eq!(features.dim(), (1, FEATURE_DIM));
    let sum: f32 = features.iter().sum();
    assert!(sum.is_finite());
}

#[test]
fn different_audio_produces_different_features() {
    let dir = tempdir().unwrap();
    let low = dir.path().join("low.wav");
    let high = dir.path().join("high.wav");
    write_sine_wav(&low, 220.0, 4.0, 22050, 1);
    write_sine_wav(&high, 1760.0, 4.0, 22050, 1);

    let features_low = extract_features(&low).unwrap();
    let features_high = extract_features(&high).unwrap();
    assert_ne!(features_low, features_high);
}
