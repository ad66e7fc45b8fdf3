//! # stance-core
//!
//! Embedding-to-classification-to-evaluation pipeline for short political
//! texts. Documents are tokenized, embedded with seeded skip-gram vectors
//! and aggregated into bounded document vectors; a kernel SVM and a random
//! forest train on the same variance-filtered feature matrix; a
//! dependency-tolerant metrics layer evaluates both and a comparison
//! report ranks the results, keeping undefined metrics as `NA`.
//!
//! ## Stages
//!
//! - **Ingestion**: minimum-length policy, text cleaning, CSV input
//! - **Tokenization**: stopword/length/numeric/URL filtering
//! - **Embedding**: deterministic skip-gram with negative sampling
//! - **Vectorization**: mean/max/sum aggregation, zero-vector fallback
//! - **Training**: one-vs-rest kernel SVM and bagged CART forest
//! - **Evaluation**: confusion-matrix metrics with a manual one-vs-rest
//!   fallback, ROC/AUC where probabilities exist, k-fold cross-validation
//!
//! ## Example
//!
//! ```rust
//! use stance_core::{Aggregation, DocumentVectorizer, EmbeddingParams, SkipGramModel, WordTokenizer};
//!
//! let tokenizer = WordTokenizer::new();
//! let corpus: Vec<Vec<String>> = [
//!     "tax reform drives economic growth",
//!     "healthcare reform expands public coverage",
//!     "the and of", // stopwords only: becomes a zero vector
//! ]
//! .iter()
//! .map(|text| tokenizer.tokenize(text))
//! .collect();
//!
//! let params = EmbeddingParams { dim: 8, window: 2, min_count: 1, iterations: 2, seed: 42 };
//! let embedding = SkipGramModel::train(&corpus, &params);
//!
//! let outcome = DocumentVectorizer::new(Aggregation::Mean).vectorize(&corpus, &embedding);
//! assert_eq!(outcome.matrix.nrows(), 3);
//! assert_eq!(outcome.empty_documents, 1);
//! assert!(outcome.matrix.iter().all(|v| v.abs() <= 1.0));
//! ```

pub mod classifiers;
pub mod config;
pub mod corpus;
pub mod crossval;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod report;
pub mod split;
pub mod tokenizers;
pub mod vectorizer;

// Re-export main types
pub use classifiers::{Classifier, KernelSvmClassifier, ProbabilityMatrix, RandomForestClassifier};
pub use config::{Aggregation, KernelKind, PipelineConfig};
pub use corpus::{read_documents_csv, Document};
pub use crossval::{CrossValidator, CvSummary};
pub use embedding::{EmbeddingParams, SkipGramModel};
pub use engine::{PipelineEngine, PipelineRun};
pub use error::{PipelineError, PipelineResult};
pub use features::{StandardScaler, VarianceFilter};
pub use metrics::{ConfusionMatrix, MetricBundle, MetricSource};
pub use report::{ComparisonReport, PredictionRow};
pub use split::{train_test_split, SplitIndices};
pub use tokenizers::WordTokenizer;
pub use vectorizer::{DocumentVectorizer, VectorizeOutcome};

/// Run the full pipeline over labeled documents with one configuration
///
/// # Example
///
/// ```rust,no_run
/// use stance_core::{run_pipeline, Document, PipelineConfig};
///
/// let documents = stance_core::read_documents_csv("labeled_posts.csv").unwrap();
/// let run = run_pipeline(documents, PipelineConfig::default()).unwrap();
/// println!("{}", run.report.to_text());
/// ```
pub fn run_pipeline(
    documents: Vec<Document>,
    config: PipelineConfig,
) -> PipelineResult<PipelineRun> {
    PipelineEngine::new(config)?.run(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_pipeline_rejects_invalid_config() {
        let config = PipelineConfig::new().with_train_fraction(2.0);
        assert!(run_pipeline(Vec::new(), config).is_err());
    }

    #[test]
    fn test_run_pipeline_rejects_empty_input() {
        assert!(run_pipeline(Vec::new(), PipelineConfig::quick()).is_err());
    }
}
