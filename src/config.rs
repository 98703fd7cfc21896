use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default model artifact filename
pub const MODEL_FILENAME: &str = "emotion.onnx";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub input_device_id: Option<String>,

    /// Capture duration in seconds
    pub record_secs: f32,

    /// Threads for ONNX inference
    pub n_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            model_path: None,
            labels_path: None,
            input_device_id: None,
            record_secs: 3.0,
            n_threads: 1,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            serde_json::from_str(&content)
                .context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;
        Ok(home.join(".emotion-cli"))
    }

    /// Get the default models directory
    pub fn default_models_dir() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("models"))
    }

    /// Get the model artifact path
    pub fn get_model_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.model_path {
            Ok(path.clone())
        } else {
            let models_dir = Self::default_models_dir()?;
            Ok(models_dir.join(MODEL_FILENAME))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.record_secs, 3.0);
        assert_eq!(config.n_threads, 1);
        assert!(config.model_path.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.model_path = Some(PathBuf::from("/models/emotion.onnx"));
        config.input_device_id = Some("USB Microphone".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.model_path, config.model_path);
        assert_eq!(loaded.input_device_id, config.input_device_id);
    }

    #[test]
    fn test_load_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.schema_version, 1);
    }

    #[test]
    fn test_explicit_model_path_wins() {
        let mut config = Config::default();
        config.model_path = Some(PathBuf::from("/custom/model.onnx"));
        assert_eq!(
            config.get_model_path().unwrap(),
            PathBuf::from("/custom/model.onnx")
        );
    }
}
