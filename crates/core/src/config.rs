//! Configuration for the classification pipeline

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Aggregation function used to collapse token embeddings into one
/// document vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Component-wise mean (default)
    Mean,
    /// Component-wise maximum
    Max,
    /// Component-wise sum
    Sum,
}

impl Default for Aggregation {
    fn default() -> Self {
        Self::Mean
    }
}

/// Kernel family for the SVM classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Linear kernel (fast, good for high-dimensional document vectors)
    Linear,
    /// Radial basis function kernel with configurable gamma
    Rbf,
}

impl Default for KernelKind {
    fn default() -> Self {
        Self::Linear
    }
}

/// Configuration for a pipeline run
///
/// All fields have defaults; partial TOML files fill in the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Embedding dimension D
    pub embedding_dim: usize,

    /// Skip-gram context window size
    pub window_size: usize,

    /// Minimum corpus frequency for a token to enter the vocabulary
    pub min_token_freq: usize,

    /// Number of passes over the corpus during embedding training
    pub embedding_iterations: usize,

    /// Token-embedding aggregation function
    pub aggregation: Aggregation,

    /// Fraction of documents assigned to the training split
    pub train_fraction: f64,

    /// Cross-validation fold count (reduced automatically on small inputs)
    pub cv_folds: usize,

    /// Kernel family for the SVM classifier
    pub kernel: KernelKind,

    /// SVM cost parameter C
    pub svm_cost: f64,

    /// RBF kernel gamma (ignored for the linear kernel)
    pub svm_gamma: f64,

    /// Request probability estimates from the SVM at construction time
    pub svm_probability: bool,

    /// Number of trees in the forest
    pub tree_count: usize,

    /// Maximum tree depth (None grows trees until leaves are pure)
    pub max_tree_depth: Option<usize>,

    /// Split-candidate count per tree node (None uses ceil(sqrt(d)))
    pub split_candidates: Option<usize>,

    /// Documents shorter than this many characters are excluded at ingestion
    pub min_doc_chars: usize,

    /// Columns with variance at or below this threshold are dropped
    pub variance_threshold: f64,

    /// Seed for every randomized step
    pub seed: u64,

    /// Metric used for ranking and cross-validation summaries
    pub primary_metric: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create a configuration with the standard defaults
    pub fn new() -> Self {
        Self {
            embedding_dim: 100,
            window_size: 5,
            min_token_freq: 2,
            embedding_iterations: 5,
            aggregation: Aggregation::Mean,
            train_fraction: 0.8,
            cv_folds: 5,
            kernel: KernelKind::Linear,
            svm_cost: 1.0,
            svm_gamma: 1.0,
            svm_probability: true,
            tree_count: 500,
            max_tree_depth: None,
            split_candidates: None,
            min_doc_chars: 20,
            variance_threshold: 1e-15,
            seed: 42,
            primary_metric: "accuracy".to_string(),
        }
    }

    /// Small-scale preset for demos and tests (narrow embeddings, few trees)
    pub fn quick() -> Self {
        Self::new()
            .with_embedding_dim(16)
            .with_embedding_iterations(3)
            .with_tree_count(25)
            .with_min_doc_chars(1)
    }

    /// Parse a configuration from TOML text; absent keys keep their defaults
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges; returns the first violation found
    pub fn validate(&self) -> PipelineResult<()> {
        if self.embedding_dim == 0 {
            return Err(PipelineError::InvalidConfig(
                "embedding_dim must be positive".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "window_size must be positive".to_string(),
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "train_fraction must lie in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if self.cv_folds < 2 {
            return Err(PipelineError::InvalidConfig(
                "cv_folds must be at least 2".to_string(),
            ));
        }
        if self.svm_cost <= 0.0 {
            return Err(PipelineError::InvalidConfig(
                "svm_cost must be positive".to_string(),
            ));
        }
        if self.svm_gamma <= 0.0 {
            return Err(PipelineError::InvalidConfig(
                "svm_gamma must be positive".to_string(),
            ));
        }
        if self.tree_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "tree_count must be positive".to_string(),
            ));
        }
        if !crate::metrics::METRIC_COLUMNS.contains(&self.primary_metric.as_str()) {
            return Err(PipelineError::MetricUndefined(self.primary_metric.clone()));
        }
        Ok(())
    }

    /// Set the embedding dimension
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Set the skip-gram window size
    pub fn with_window_size(mut self, window: usize) -> Self {
        self.window_size = window;
        self
    }

    /// Set the minimum token frequency
    pub fn with_min_token_freq(mut self, freq: usize) -> Self {
        self.min_token_freq = freq;
        self
    }

    /// Set the embedding training iteration count
    pub fn with_embedding_iterations(mut self, iterations: usize) -> Self {
        self.embedding_iterations = iterations;
        self
    }

    /// Set the document-vector aggregation function
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set the train fraction
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Set the cross-validation fold count
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Set the SVM kernel family
    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the SVM cost parameter
    pub fn with_svm_cost(mut self, cost: f64) -> Self {
        self.svm_cost = cost;
        self
    }

    /// Set the RBF gamma
    pub fn with_svm_gamma(mut self, gamma: f64) -> Self {
        self.svm_gamma = gamma;
        self
    }

    /// Request or skip SVM probability estimates
    pub fn with_svm_probability(mut self, enable: bool) -> Self {
        self.svm_probability = enable;
        self
    }

    /// Set the forest tree count
    pub fn with_tree_count(mut self, trees: usize) -> Self {
        self.tree_count = trees;
        self
    }

    /// Cap the tree depth
    pub fn with_max_tree_depth(mut self, depth: Option<usize>) -> Self {
        self.max_tree_depth = depth;
        self
    }

    /// Set the per-node split-candidate count
    pub fn with_split_candidates(mut self, candidates: Option<usize>) -> Self {
        self.split_candidates = candidates;
        self
    }

    /// Set the minimum document length in characters
    pub fn with_min_doc_chars(mut self, chars: usize) -> Self {
        self.min_doc_chars = chars;
        self
    }

    /// Set the variance-filter threshold
    pub fn with_variance_threshold(mut self, threshold: f64) -> Self {
        self.variance_threshold = threshold;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the primary comparison metric
    pub fn with_primary_metric(mut self, metric: impl Into<String>) -> Self {
        self.primary_metric = metric.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.embedding_dim, 100);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.min_token_freq, 2);
        assert_eq!(config.train_fraction, 0.8);
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.tree_count, 500);
        assert_eq!(config.aggregation, Aggregation::Mean);
        assert_eq!(config.primary_metric, "accuracy");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_embedding_dim(50)
            .with_aggregation(Aggregation::Max)
            .with_kernel(KernelKind::Rbf)
            .with_seed(7);

        assert_eq!(config.embedding_dim, 50);
        assert_eq!(config.aggregation, Aggregation::Max);
        assert_eq!(config.kernel, KernelKind::Rbf);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_toml_partial_overrides() {
        let config = PipelineConfig::from_toml_str(
            r#"
            embedding_dim = 64
            aggregation = "sum"
            kernel = "rbf"
            svm_gamma = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.embedding_dim, 64);
        assert_eq!(config.aggregation, Aggregation::Sum);
        assert_eq!(config.kernel, KernelKind::Rbf);
        assert_eq!(config.svm_gamma, 0.5);
        // Untouched keys keep their defaults
        assert_eq!(config.window_size, 5);
        assert_eq!(config.tree_count, 500);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineConfig::new()
            .with_train_fraction(1.0)
            .validate()
            .is_err());
        assert!(PipelineConfig::new().with_cv_folds(1).validate().is_err());
        assert!(PipelineConfig::new()
            .with_primary_metric("luminosity")
            .validate()
            .is_err());
    }
}
