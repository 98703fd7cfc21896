//! The emotion label set and its on-disk contract.
//!
//! The classifier's output indices only mean something relative to the label
//! order used at training time. That order is persisted as a `labels.json`
//! sidecar next to the model artifact; the built-in order below is the
//! fallback for artifacts shipped without one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::ClassifierError;

/// Number of emotion classes the model discriminates
pub const EMOTION_LABEL_COUNT: usize = 8;

/// Sidecar schema version this build understands
const LABEL_SCHEMA_VERSION: u32 = 1;

/// One of the eight emotion categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
    Calm,
}

impl EmotionLabel {
    /// All labels in training order
    pub const ALL: [EmotionLabel; EMOTION_LABEL_COUNT] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angry => "angry",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Sad => "sad",
            Self::Surprise => "surprise",
            Self::Calm => "calm",
        }
    }

    /// Capitalized form for user-facing output
    pub fn display_name(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "angry" => Ok(Self::Angry),
            "disgust" => Ok(Self::Disgust),
            "fear" => Ok(Self::Fear),
            "happy" => Ok(Self::Happy),
            "neutral" => Ok(Self::Neutral),
            "sad" => Ok(Self::Sad),
            "surprise" => Ok(Self::Surprise),
            "calm" => Ok(Self::Calm),
            _ => Err(format!("Unknown emotion label: {}", s)),
        }
    }
}

/// Ordered label list matching the classifier's output indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSet {
    pub schema_version: u32,
    pub labels: Vec<EmotionLabel>,
}

impl LabelSet {
    /// The built-in training order
    pub fn builtin() -> Self {
        Self {
            schema_version: LABEL_SCHEMA_VERSION,
            labels: EmotionLabel::ALL.to_vec(),
        }
    }

    /// Load a label sidecar and validate the contract.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::LabelSet(format!("Failed to read {:?}: {}", path, e))
        })?;
        let set: LabelSet = serde_json::from_str(&content).map_err(|e| {
            ClassifierError::LabelSet(format!("Failed to parse {:?}: {}", path, e))
        })?;
        set.validate()?;

        debug!("Loaded label set from {:?}: {:?}", path, set.labels);
        Ok(set)
    }

    /// Resolve the label set for a model artifact: an explicit sidecar path,
    /// else `labels.json` next to the artifact, else the built-in order.
    pub fn for_model(
        model_path: &Path,
        labels_path: Option<&Path>,
    ) -> Result<Self, ClassifierError> {
        if let Some(path) = labels_path {
            return Self::load(path);
        }

        let sidecar = model_path.with_file_name("labels.json");
        if sidecar.exists() {
            Self::load(&sidecar)
        } else {
            debug!("No label sidecar next to {:?}, using built-in order", model_path);
            Ok(Self::builtin())
        }
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.schema_version != LABEL_SCHEMA_VERSION {
            return Err(ClassifierError::LabelSet(format!(
                "Unsupported schema version {} (expected {})",
                self.schema_version, LABEL_SCHEMA_VERSION
            )));
        }
        if self.labels.len() != EMOTION_LABEL_COUNT {
            return Err(ClassifierError::LabelSet(format!(
                "Expected {} labels, got {}",
                EMOTION_LABEL_COUNT,
                self.labels.len()
            )));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[..i].contains(label) {
                return Err(ClassifierError::LabelSet(format!(
                    "Duplicate label: {}",
                    label
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<EmotionLabel> {
        self.labels.get(index).copied()
    }
}
