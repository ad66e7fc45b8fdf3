//! Classifier families
//!
//! Two interchangeable model families train on the same feature matrix
//! and label vector: a kernel SVM and a random forest. Both implement
//! [`Classifier`] so evaluation and reporting stay agnostic about which
//! family produced a prediction.

pub mod kernel_svm;
pub mod random_forest;

pub use kernel_svm::KernelSvmClassifier;
pub use random_forest::RandomForestClassifier;

use ndarray::Array2;

use crate::error::{PipelineError, PipelineResult};

/// Minimum training rows below which model training is refused
pub const MIN_TRAIN_ROWS: usize = 50;

/// Per-class probabilities for a batch of rows
#[derive(Debug, Clone)]
pub struct ProbabilityMatrix {
    /// Column labels, sorted
    pub classes: Vec<String>,
    /// One row per input row, one column per class; rows sum to one
    pub values: Array2<f64>,
}

impl ProbabilityMatrix {
    /// Probability column for one class, `None` when the class is unknown
    pub fn class_column(&self, class: &str) -> Option<Vec<f64>> {
        let col = self.classes.iter().position(|c| c == class)?;
        Some(self.values.column(col).to_vec())
    }
}

/// Trait for trained classification models
pub trait Classifier: Send + Sync {
    /// Short stable name used in reports and artifact file names
    fn name(&self) -> &str;

    /// Class labels the model can emit, sorted
    fn classes(&self) -> &[String];

    /// Predict one label per feature row
    fn predict(&self, features: &Array2<f64>) -> Vec<String>;

    /// Whether [`Classifier::predict_proba`] returns probabilities
    fn supports_probabilities(&self) -> bool {
        false
    }

    /// Per-class probabilities, `None` when unsupported
    fn predict_proba(&self, _features: &Array2<f64>) -> Option<ProbabilityMatrix> {
        None
    }

    /// Per-feature importance scores, `None` when the family has no
    /// native notion of importance
    fn feature_importance(&self) -> Option<Vec<f64>> {
        None
    }

    /// Serialize the trained model for persistence
    fn to_json(&self) -> PipelineResult<String>;

    /// Clone into a box
    fn clone_box(&self) -> Box<dyn Classifier>;
}

impl Clone for Box<dyn Classifier> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Validate a training split and return its sorted distinct classes.
///
/// Training is refused when there are fewer than [`MIN_TRAIN_ROWS`] rows
/// or fewer than two distinct labels.
pub fn ensure_trainable(
    features: &Array2<f64>,
    labels: &[String],
    context: &str,
) -> PipelineResult<Vec<String>> {
    let mut classes: Vec<String> = labels.to_vec();
    classes.sort();
    classes.dedup();

    if features.nrows() != labels.len() {
        return Err(PipelineError::TrainingFailure {
            model: context.to_string(),
            reason: format!(
                "feature rows ({}) do not match label count ({})",
                features.nrows(),
                labels.len()
            ),
        });
    }
    if features.nrows() < MIN_TRAIN_ROWS || classes.len() < 2 {
        return Err(PipelineError::insufficient(
            features.nrows(),
            classes.len(),
            context,
        ));
    }

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_trainable_rejects_small_or_single_class_data() {
        let features = Array2::zeros((10, 3));
        let labels: Vec<String> = (0..10)
            .map(|i| if i % 2 == 0 { "left" } else { "right" })
            .map(str::to_string)
            .collect();
        assert!(ensure_trainable(&features, &labels, "kernel_svm").is_err());

        let features = Array2::zeros((60, 3));
        let labels = vec!["left".to_string(); 60];
        assert!(ensure_trainable(&features, &labels, "kernel_svm").is_err());
    }

    #[test]
    fn test_ensure_trainable_returns_sorted_classes() {
        let features = Array2::zeros((60, 3));
        let labels: Vec<String> = (0..60)
            .map(|i| match i % 3 {
                0 => "right",
                1 => "left",
                _ => "center",
            })
            .map(str::to_string)
            .collect();
        let classes = ensure_trainable(&features, &labels, "kernel_svm").unwrap();
        assert_eq!(classes, vec!["center", "left", "right"]);
    }

    #[test]
    fn test_probability_matrix_column_lookup() {
        let proba = ProbabilityMatrix {
            classes: vec!["left".to_string(), "right".to_string()],
            values: ndarray::array![[0.3, 0.7], [0.9, 0.1]],
        };
        assert_eq!(proba.class_column("right"), Some(vec![0.7, 0.1]));
        assert!(proba.class_column("center").is_none());
    }
}
