//! Microphone capture for fixed-duration clips.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use ringbuf::traits::{Consumer as ConsumerTrait, Producer as ProducerTrait, Split};
use ringbuf::{HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::AudioError;

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// List available input devices
pub fn list_input_devices() -> Result<Vec<AudioDevice>, AudioError> {
    let host = cpal::default_host();
    let default_device = host.default_input_device();
    let default_name = default_device
        .as_ref()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    let mut devices = Vec::new();

    for device in host
        .input_devices()
        .map_err(|e| AudioError::Device(format!("Failed to enumerate input devices: {}", e)))?
    {
        if let Ok(name) = device.name() {
            let is_default = name == default_name;
            devices.push(AudioDevice {
                id: name.clone(),
                name,
                is_default,
            });
        }
    }

    Ok(devices)
}

/// Get device by ID (name) or return default
pub fn get_device(device_id: Option<&str>) -> Result<Device, AudioError> {
    let host = cpal::default_host();

    match device_id {
        Some(id) if id != "default" => {
            for device in host
                .input_devices()
                .map_err(|e| AudioError::Device(format!("Failed to enumerate devices: {}", e)))?
            {
                if let Ok(name) = device.name() {
                    if name == id {
                        return Ok(device);
                    }
                }
            }
            Err(AudioError::Device(format!("Device not found: {}", id)))
        }
        _ => host
            .default_input_device()
            .ok_or_else(|| AudioError::Device("No default input device available".to_string())),
    }
}

/// Selected audio configuration with both stream config and sample format
pub struct SelectedConfig {
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
}

/// Select the best input configuration for a device
pub fn select_input_config(device: &Device) -> Result<SelectedConfig, AudioError> {
    // First try to find a mono config
    if let Ok(supported) = device.supported_input_configs() {
        for config_range in supported {
            if config_range.channels() == 1 {
                let supported_config = config_range.with_max_sample_rate();
                debug!(
                    "Selected mono config: {} Hz, {} channels, format {:?}",
                    supported_config.sample_rate().0,
                    supported_config.channels(),
                    supported_config.sample_format()
                );
                return Ok(SelectedConfig {
                    config: supported_config.clone().into(),
                    sample_format: supported_config.sample_format(),
                });
            }
        }
    }

    // Fall back to default (will downmix in callback)
    let supported_config = device
        .default_input_config()
        .map_err(|e| AudioError::Device(format!("No default input config: {}", e)))?;
    debug!(
        "Using default config (will downmix): {} Hz, {} channels, format {:?}",
        supported_config.sample_rate().0,
        supported_config.channels(),
        supported_config.sample_format()
    );
    Ok(SelectedConfig {
        config: supported_config.clone().into(),
        sample_format: supported_config.sample_format(),
    })
}

/// A captured clip: mono samples at the device sample rate
#[derive(Debug, Clone)]
pub struct RecordedClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl RecordedClip {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Record a fixed-duration mono clip from an input device.
///
/// Blocks for the full capture duration; there is no mid-capture
/// cancellation. The device callback writes into an SPSC ring buffer and
/// this thread drains it until the requested number of samples arrives.
pub fn record_clip(device: &Device, duration: Duration) -> Result<RecordedClip, AudioError> {
    let selected = select_input_config(device)?;
    let config = selected.config;
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;
    let target_samples = (duration.as_secs_f64() * sample_rate as f64).round() as usize;

    info!(
        "Recording {:.1}s at {} Hz ({} channels)",
        duration.as_secs_f64(),
        sample_rate,
        channels
    );

    // One extra second of headroom so the callback never starves mid-clip
    let rb = HeapRb::<f32>::new(target_samples + sample_rate as usize);
    let (mut producer, mut consumer) = rb.split();

    let overflow_counter = Arc::new(AtomicU64::new(0));
    let overflow_clone = overflow_counter.clone();

    let error_callback = |err| {
        error!("Audio stream error: {}", err);
    };

    let stream = match selected.sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                handle_input_f32(data, channels, &mut producer, &overflow_clone);
            },
            error_callback,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| {
                handle_input_i16(data, channels, &mut producer, &overflow_clone);
            },
            error_callback,
            None,
        ),
        SampleFormat::U8 => device.build_input_stream(
            &config,
            move |data: &[u8], _| {
                handle_input_u8(data, channels, &mut producer, &overflow_clone);
            },
            error_callback,
            None,
        ),
        other => {
            return Err(AudioError::Capture(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| AudioError::Capture(format!("Failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| AudioError::Capture(format!("Failed to start audio stream: {}", e)))?;

    let mut samples: Vec<f32> = Vec::with_capacity(target_samples);
    let mut scratch = vec![0.0f32; 4096];
    let deadline = Instant::now() + duration + Duration::from_secs(2);

    while samples.len() < target_samples {
        let read = consumer.pop_slice(&mut scratch);
        if read > 0 {
            let take = read.min(target_samples - samples.len());
            samples.extend_from_slice(&scratch[..take]);
        } else {
            std::thread::sleep(Duration::from_millis(5));
        }

        if Instant::now() > deadline && samples.len() < target_samples {
            let _ = stream.pause();
            return Err(AudioError::Capture(format!(
                "Device delivered only {} of {} samples",
                samples.len(),
                target_samples
            )));
        }
    }

    if let Err(e) = stream.pause() {
        warn!("Failed to stop audio stream: {}", e);
    }
    drop(stream);

    let overflows = overflow_counter.load(Ordering::Relaxed);
    if overflows > 0 {
        warn!("Ring buffer overflowed {} times during capture", overflows);
    }

    info!("Recording completed: {} samples", samples.len());

    Ok(RecordedClip {
        samples,
        sample_rate,
    })
}

/// Handle f32 input samples
fn handle_input_f32(
    data: &[f32],
    channels: usize,
    producer: &mut HeapProd<f32>,
    overflow_counter: &AtomicU64,
) {
    if channels == 1 {
        // Mono: push directly
        let pushed = producer.push_slice(data);
        if pushed < data.len() {
            overflow_counter.fetch_add(1, Ordering::Relaxed);
        }
    } else {
        // Downmix: take first channel only
        for chunk in data.chunks(channels) {
            if producer.try_push(chunk[0]).is_err() {
                overflow_counter.fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
    }
}

/// Handle i16 input samples (convert to f32)
fn handle_input_i16(
    data: &[i16],
    channels: usize,
    producer: &mut HeapProd<f32>,
    overflow_counter: &AtomicU64,
) {
    for chunk in data.chunks(channels) {
        let sample = chunk[0] as f32 / 32768.0;
        if producer.try_push(sample).is_err() {
            overflow_counter.fetch_add(1, Ordering::Relaxed);
            break;
        }
    }
}

/// Handle u8 input samples (convert to f32)
fn handle_input_u8(
    data: &[u8],
    channels: usize,
    producer: &mut HeapProd<f32>,
    overflow_counter: &AtomicU64,
) {
    for chunk in data.chunks(channels) {
        // u8 is unsigned: 0-255, with 128 as center
        let sample = (chunk[0] as f32 - 128.0) / 128.0;
        if producer.try_push(sample).is_err() {
            overflow_counter.fetch_add(1, Ordering::Relaxed);
            break;
        }
    }
}
