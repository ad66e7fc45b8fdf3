//! Feature-space transforms
//!
//! Column selection and scaling applied between vectorization and model
//! training. Both transforms are fitted on training rows only and then
//! replayed on any matrix with the same width.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard deviation floor, keeps constant columns from dividing by zero
const STD_FLOOR: f64 = 1e-6;

/// Drops columns whose training-row variance is at or below a threshold.
///
/// When every column would be dropped the filter falls back to keeping
/// the full matrix so downstream training still receives features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceFilter {
    kept: Vec<usize>,
    input_dim: usize,
    threshold: f64,
    /// True when no column passed the threshold and all were kept instead
    pub fallback: bool,
}

impl VarianceFilter {
    /// Fit the filter on a subset of rows, typically the training split.
    pub fn fit(matrix: &Array2<f64>, rows: &[usize], threshold: f64) -> Self {
        let input_dim = matrix.ncols();
        let mut kept = Vec::new();

        if !rows.is_empty() {
            let n = rows.len() as f64;
            for col in 0..input_dim {
                let mean: f64 = rows.iter().map(|&r| matrix[[r, col]]).sum::<f64>() / n;
                let variance: f64 = rows
                    .iter()
                    .map(|&r| {
                        let d = matrix[[r, col]] - mean;
                        d * d
                    })
                    .sum::<f64>()
                    / n;
                if variance > threshold {
                    kept.push(col);
                }
            }
        }

        let fallback = kept.is_empty();
        if fallback {
            kept = (0..input_dim).collect();
            tracing::warn!(
                columns = input_dim,
                "no column exceeded the variance threshold, keeping full matrix"
            );
        } else if kept.len() < input_dim {
            tracing::info!(
                kept = kept.len(),
                dropped = input_dim - kept.len(),
                "variance filter dropped near-constant columns"
            );
        }

        Self {
            kept,
            input_dim,
            threshold,
            fallback,
        }
    }

    /// Project a matrix onto the kept columns.
    pub fn apply(&self, matrix: &Array2<f64>) -> Array2<f64> {
        matrix.select(Axis(1), &self.kept)
    }

    /// Indices of the surviving columns
    pub fn kept(&self) -> &[usize] {
        &self.kept
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.kept.len()
    }
}

/// Per-column standardization to zero mean and unit variance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and standard deviations on the given matrix.
    pub fn fit(matrix: &Array2<f64>) -> Self {
        let n = matrix.nrows().max(1) as f64;
        let mut means = Vec::with_capacity(matrix.ncols());
        let mut stds = Vec::with_capacity(matrix.ncols());

        for col in matrix.columns() {
            let mean = col.sum() / n;
            let variance = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            means.push(mean);
            stds.push(variance.sqrt().max(STD_FLOOR));
        }

        Self { means, stds }
    }

    /// Standardize a matrix with the fitted statistics.
    pub fn transform(&self, matrix: &Array2<f64>) -> Array2<f64> {
        let mut out = matrix.clone();
        for (col, mut column) in out.columns_mut().into_iter().enumerate() {
            let mean = self.means[col];
            let std = self.stds[col];
            column.mapv_inplace(|v| (v - mean) / std);
        }
        out
    }

    pub fn fit_transform(matrix: &Array2<f64>) -> (Self, Array2<f64>) {
        let scaler = Self::fit(matrix);
        let transformed = scaler.transform(matrix);
        (scaler, transformed)
    }
}
