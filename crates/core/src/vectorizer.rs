//! Document vectorization
//!
//! Aggregates token embeddings into one fixed-width vector per document
//! and scales each vector to unit max-norm so no document's magnitude
//! dominates the distance-based classifiers.

use ndarray::Array2;

use crate::config::Aggregation;
use crate::embedding::SkipGramModel;

/// Keeps each vector's post-scaling maximum absolute value strictly
/// below one.
const SCALE_EPSILON: f64 = 1e-12;

/// Result of vectorizing a tokenized corpus
#[derive(Debug)]
pub struct VectorizeOutcome {
    /// One row per document, columns are embedding dimensions
    pub matrix: Array2<f64>,
    /// Documents with no in-vocabulary token, mapped to zero vectors
    pub empty_documents: usize,
    /// Non-finite aggregate values coerced to zero
    pub coerced_values: usize,
}

/// Turns tokenized documents into embedding-space feature rows
#[derive(Debug, Clone)]
pub struct DocumentVectorizer {
    aggregation: Aggregation,
}

impl DocumentVectorizer {
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }

    /// Vectorize the corpus against a trained embedding model.
    ///
    /// Each document aggregates the vectors of its in-vocabulary tokens;
    /// documents without any in-vocabulary token become zero rows. Any
    /// non-finite aggregate value is coerced to zero, then each non-zero
    /// vector is divided by its own maximum absolute value plus a small
    /// epsilon, so every non-zero row has max |component| just under one.
    pub fn vectorize(&self, corpus: &[Vec<String>], model: &SkipGramModel) -> VectorizeOutcome {
        let dim = model.dim();
        let mut matrix = Array2::zeros((corpus.len(), dim));
        let mut empty_documents = 0;
        let mut coerced_values = 0;

        for (row, tokens) in corpus.iter().enumerate() {
            let vectors: Vec<&[f64]> = tokens.iter().filter_map(|t| model.vector(t)).collect();
            if vectors.is_empty() || dim == 0 {
                empty_documents += 1;
                continue;
            }

            let aggregated = self.aggregate(&vectors, dim);
            let mut target = matrix.row_mut(row);
            for (k, value) in aggregated.into_iter().enumerate() {
                if value.is_finite() {
                    target[k] = value;
                } else {
                    target[k] = 0.0;
                    coerced_values += 1;
                }
            }

            // Per-document scaling; all-zero vectors stay zero.
            let max_abs = target.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
            if max_abs > 0.0 {
                let scale = max_abs + SCALE_EPSILON;
                target.mapv_inplace(|v| v / scale);
            }
        }

        if coerced_values > 0 {
            tracing::warn!(
                coerced = coerced_values,
                "coerced non-finite document vector values to zero"
            );
        }
        if empty_documents > 0 {
            tracing::info!(
                empty = empty_documents,
                "documents without in-vocabulary tokens mapped to zero vectors"
            );
        }

        VectorizeOutcome {
            matrix,
            empty_documents,
            coerced_values,
        }
    }

    fn aggregate(&self, vectors: &[&[f64]], dim: usize) -> Vec<f64> {
        match self.aggregation {
            Aggregation::Mean => {
                let mut acc = vec![0.0; dim];
                for v in vectors {
                    for (a, x) in acc.iter_mut().zip(v.iter()) {
                        *a += x;
                    }
                }
                let n = vectors.len() as f64;
                acc.iter_mut().for_each(|a| *a /= n);
                acc
            }
            Aggregation::Sum => {
                let mut acc = vec![0.0; dim];
                for v in vectors {
                    for (a, x) in acc.iter_mut().zip(v.iter()) {
                        *a += x;
                    }
                }
                acc
            }
            Aggregation::Max => {
                let mut acc = vectors[0].to_vec();
                for v in &vectors[1..] {
                    for (a, x) in acc.iter_mut().zip(v.iter()) {
                        *a = a.max(*x);
                    }
                }
                acc
            }
        }
    }
}
