use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use emotion_cli::audio::{get_device, list_input_devices, record_clip};
use emotion_cli::classifier::{ClassifierConfig, EmotionClassifier};
use emotion_cli::config::Config;
use emotion_cli::session::{predict_recording, predict_wav};

/// Headless CLI for offline speech emotion recognition
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a WAV file to classify (omit when using --record)
    input: Option<PathBuf>,

    /// Record a clip from the microphone instead of reading a file
    #[arg(short, long)]
    record: bool,

    /// Input device ID (use "default" or run with --list-devices)
    #[arg(short, long, default_value = "default")]
    device: String,

    /// Path to the ONNX emotion model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Path to the label sidecar (default: labels.json next to the model)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Recording duration in seconds
    #[arg(long)]
    duration: Option<f32>,

    /// Number of threads for ONNX inference
    #[arg(long)]
    threads: Option<usize>,

    /// List available input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Handle --list-devices
    if args.list_devices {
        return list_devices_and_exit();
    }

    let config = Config::load(&Config::default_config_dir()?.join("config.json"))?;

    // Determine model path
    let model_path = match &args.model {
        Some(path) => path.clone(),
        None => config.get_model_path()?,
    };

    info!("Emotion recognition CLI starting...");
    info!("Model: {:?}", model_path);

    // Check if model exists
    if !model_path.exists() {
        error!("Model file not found: {:?}", model_path);
        eprintln!("\nModel file not found: {:?}", model_path);
        eprintln!("\nPlace a pretrained emotion model (ONNX, 40 MFCC inputs,");
        eprintln!("8 class scores) at the expected location, or specify a");
        eprintln!("custom path with: --model /path/to/emotion.onnx");
        return Ok(());
    }

    // Load the classifier once; it is reused for the whole process lifetime
    info!("Loading emotion model...");
    let mut classifier = EmotionClassifier::new(ClassifierConfig {
        model_path,
        labels_path: args.labels.clone().or_else(|| config.labels_path.clone()),
        n_threads: args.threads.unwrap_or(config.n_threads),
    })?;
    info!("Model loaded successfully");

    let prediction = if args.record {
        let device_id = if args.device == "default" {
            config.input_device_id.clone()
        } else {
            Some(args.device.clone())
        };
        let device = get_device(device_id.as_deref())?;
        let duration = args.duration.unwrap_or(config.record_secs);

        println!("Recording for {:.1}s...", duration);
        let clip = record_clip(&device, Duration::from_secs_f32(duration))?;
        println!("Recording completed. Processing...");

        predict_recording(clip, &mut classifier)?
    } else if let Some(ref input) = args.input {
        info!("Input: {:?}", input);
        predict_wav(input, &mut classifier)?
    } else {
        anyhow::bail!("Provide a WAV file path, or use --record to capture from the microphone");
    };

    println!(
        "Predicted emotion: {} (score {:.3})",
        prediction.label.display_name(),
        prediction.score()
    );

    Ok(())
}

fn list_devices_and_exit() -> Result<()> {
    let devices = list_input_devices()?;

    if devices.is_empty() {
        println!("No input devices found.");
        return Ok(());
    }

    println!("Available input devices:");
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("  {}{}", device.name, marker);
    }

    Ok(())
}
