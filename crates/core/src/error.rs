//! Error types for the classification pipeline.
//!
//! Recoverable conditions (stratification downgrade, variance-filter
//! fallback, undefined per-class metrics) are handled in place and logged;
//! the variants here cover the cases a caller has to act on.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type for all pipeline stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Too few rows or classes to train or split meaningfully.
    #[error("insufficient data for {context}: {rows} rows, {classes} classes")]
    InsufficientData {
        rows: usize,
        classes: usize,
        context: String,
    },

    /// Splitting is impossible, not merely unstratifiable.
    #[error("degenerate split: {0}")]
    DegenerateSplit(String),

    /// A metric selector names a metric the bundle does not carry.
    ///
    /// Per-metric undefinedness inside a bundle is represented as `None`
    /// and never raised as an error.
    #[error("unknown metric: {0}")]
    MetricUndefined(String),

    /// The underlying learner rejected its training inputs. Aborts the
    /// affected model only; sibling models keep running.
    #[error("training failed for {model}: {reason}")]
    TrainingFailure { model: String, reason: String },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model or embedding serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file parsing failed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Tabular input or output failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact persistence failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Shorthand for the training degeneracy guard.
    pub fn insufficient(rows: usize, classes: usize, context: impl Into<String>) -> Self {
        Self::InsufficientData {
            rows,
            classes,
            context: context.into(),
        }
    }

    /// Shorthand for model-unit training failures.
    pub fn training(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TrainingFailure {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::insufficient(10, 1, "kernel_svm");
        assert_eq!(
            err.to_string(),
            "insufficient data for kernel_svm: 10 rows, 1 classes"
        );

        let err = PipelineError::training("random_forest", "singular matrix");
        assert!(err.to_string().contains("random_forest"));
    }
}
