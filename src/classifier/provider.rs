//! ONNX-based emotion classifier adapter.
//!
//! Wraps a pretrained model artifact with a fixed input shape of `[1, 40]`
//! mean MFCCs and a fixed output of 8 raw class scores.

use ndarray::Array2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::PathBuf;
use tracing::{debug, info};

use super::labels::{EmotionLabel, LabelSet};
use super::ClassifierError;
use crate::features::FEATURE_DIM;

/// Configuration for the emotion classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to the ONNX model artifact
    pub model_path: PathBuf,
    /// Explicit label sidecar path (default: `labels.json` next to the model)
    pub labels_path: Option<PathBuf>,
    /// Number of threads for ONNX inference
    pub n_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            labels_path: None,
            n_threads: 1,
        }
    }
}

impl ClassifierConfig {
    pub fn with_model_path(model_path: PathBuf) -> Self {
        Self {
            model_path,
            ..Default::default()
        }
    }
}

/// The label with the highest classifier-assigned score
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: EmotionLabel,
    pub index: usize,
    pub scores: Vec<f32>,
}

impl Prediction {
    /// Raw score of the winning class
    pub fn score(&self) -> f32 {
        self.scores[self.index]
    }
}

/// Emotion classifier over a pretrained ONNX artifact
pub struct EmotionClassifier {
    session: Session,
    labels: LabelSet,
}

impl EmotionClassifier {
    /// Load the model artifact and its label contract.
    ///
    /// Fatal on a missing or unloadable artifact; no inference is possible
    /// without it.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        if !config.model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model not found at {:?}",
                config.model_path
            )));
        }

        let labels = LabelSet::for_model(&config.model_path, config.labels_path.as_deref())?;

        let session = Session::builder()
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .with_intra_threads(config.n_threads)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;

        info!(
            "Emotion classifier initialized with model: {:?}",
            config.model_path
        );

        Ok(Self { session, labels })
    }

    /// Classify a `(1, 40)` feature matrix.
    ///
    /// Validates the input shape before inference and the raw score count
    /// against the label contract after it. Ties resolve to the lowest
    /// index.
    pub fn predict(&mut self, features: &Array2<f32>) -> Result<Prediction, ClassifierError> {
        validate_shape(features)?;

        let input_shape = [1_usize, FEATURE_DIM];
        let input_data: Vec<f32> = features.iter().copied().collect();

        let input_tensor = Value::from_array((input_shape, input_data))
            .map_err(|e: ort::Error| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e: ort::Error| ClassifierError::Inference(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifierError::Inference("No output from model".to_string()))?;

        let output_tensor = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| ClassifierError::Inference(e.to_string()))?;

        let scores: Vec<f32> = output_tensor.1.iter().copied().collect();

        if scores.len() != self.labels.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: [1, self.labels.len()],
                actual: [1, scores.len()],
            });
        }

        let index = argmax(&scores);
        let label = self.labels.label(index).ok_or_else(|| {
            ClassifierError::Inference(format!("Winning index {} has no label", index))
        })?;

        debug!(
            "Predicted {} (index {}, score {:.3})",
            label,
            index,
            scores[index]
        );

        Ok(Prediction {
            label,
            index,
            scores,
        })
    }

    /// The label order this classifier maps output indices through
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Reject anything that is not a `(1, 40)` matrix before inference
fn validate_shape(features: &Array2<f32>) -> Result<(), ClassifierError> {
    let (rows, width) = features.dim();
    if rows != 1 || width != FEATURE_DIM {
        return Err(ClassifierError::ShapeMismatch {
            expected: [1, FEATURE_DIM],
            actual: [rows, width],
        });
    }
    Ok(())
}

/// Index of the maximum score; ties go to the lowest index
fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_one_by_forty() {
        let features = Array2::<f32>::zeros((1, FEATURE_DIM));
        assert!(validate_shape(&features).is_ok());
    }

    #[test]
    fn test_rejects_narrow_vector() {
        // Simulated corruption: one coefficient short
        let features = Array2::<f32>::zeros((1, FEATURE_DIM - 1));
        let result = validate_shape(&features);
        assert!(matches!(
            result,
            Err(ClassifierError::ShapeMismatch {
                expected: [1, 40],
                actual: [1, 39],
            })
        ));
    }

    #[test]
    fn test_rejects_extra_batch_rows() {
        let features = Array2::<f32>::zeros((2, FEATURE_DIM));
        assert!(matches!(
            validate_shape(&features),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_model_not_found() {
        let config = ClassifierConfig::with_model_path(PathBuf::from("/nonexistent/model.onnx"));
        let result = EmotionClassifier::new(config);
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }

    #[test]
    fn test_argmax_picks_maximum() {
        assert_eq!(argmax(&[0.1, 0.5, 0.3]), 1);
        assert_eq!(argmax(&[0.9, 0.5, 0.3]), 0);
        assert_eq!(argmax(&[0.1, 0.2, 0.8]), 2);
    }

    #[test]
    fn test_argmax_ties_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.5, 0.5]), 1);
    }

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.n_threads, 1);
        assert!(config.labels_path.is_none());
    }
}
