//! K-fold cross-validation
//!
//! Repeated train/evaluate cycles over stratified folds. Every fold
//! retrains from scratch through a caller-supplied closure; nothing fitted
//! on one fold's training rows leaks into another fold's evaluation. The
//! fold count degrades automatically on small inputs.

use ndarray::{Array2, Axis};

use crate::classifiers::Classifier;
use crate::error::PipelineResult;
use crate::metrics::MetricBundle;
use crate::split::stratified_folds;

/// Minimum rows per fold before the fold count is reduced.
const MIN_ROWS_PER_FOLD: usize = 3;

/// Lowest fold count cross-validation still makes sense at.
const MIN_FOLDS: usize = 2;

/// Summary of one model family's cross-validation run
#[derive(Debug, Clone)]
pub struct CvSummary {
    pub model_name: String,
    /// Metric the folds were scored on
    pub metric: String,
    /// Fold count requested in configuration
    pub requested_folds: usize,
    /// Fold count actually used after degradation
    pub folds: usize,
    /// Per-fold scores; `None` where the metric was undefined
    pub scores: Vec<Option<f64>>,
    /// Mean over folds where the metric was defined
    pub mean: Option<f64>,
    /// Sample standard deviation over defined folds (needs at least two)
    pub std_dev: Option<f64>,
}

/// Runs stratified k-fold evaluation with per-fold retraining
#[derive(Debug, Clone)]
pub struct CrossValidator {
    k: usize,
    seed: u64,
}

impl CrossValidator {
    pub fn new(k: usize, seed: u64) -> Self {
        Self { k, seed }
    }

    /// Fold count after degradation: `min(k, ⌊n/3⌋)`, floored at two so
    /// a fold always has something to train against.
    pub fn effective_folds(&self, n: usize) -> usize {
        self.k.min(n / MIN_ROWS_PER_FOLD).max(MIN_FOLDS)
    }

    /// Run cross-validation over the full labeled feature matrix.
    ///
    /// `train` receives each fold's training rows and labels and returns
    /// a freshly fitted model; its errors (insufficient fold data, solver
    /// rejection) propagate so the caller can record the family failure.
    /// The primary metric is read from each fold's test bundle; folds
    /// where it is undefined contribute `None` and are skipped by the
    /// mean and standard deviation.
    pub fn run<F>(
        &self,
        features: &Array2<f64>,
        labels: &[String],
        model_name: &str,
        metric: &str,
        train: F,
    ) -> PipelineResult<CvSummary>
    where
        F: Fn(&Array2<f64>, &[String]) -> PipelineResult<Box<dyn Classifier>>,
    {
        let k = self.effective_folds(labels.len());
        if k < self.k {
            tracing::warn!(
                requested = self.k,
                effective = k,
                rows = labels.len(),
                "reduced cross-validation fold count for small input"
            );
        }
        let folds = stratified_folds(labels, k, self.seed)?;

        let mut scores = Vec::with_capacity(k);
        for (fold, held_out) in folds.iter().enumerate() {
            let train_rows: Vec<usize> =
                (0..labels.len()).filter(|i| !held_out.contains(i)).collect();

            let train_features = features.select(Axis(0), &train_rows);
            let train_labels: Vec<String> =
                train_rows.iter().map(|&i| labels[i].clone()).collect();
            let test_features = features.select(Axis(0), held_out);
            let test_labels: Vec<String> =
                held_out.iter().map(|&i| labels[i].clone()).collect();

            let model = train(&train_features, &train_labels)?;
            let predicted = model.predict(&test_features);
            let proba = model.predict_proba(&test_features);

            let bundle = MetricBundle::evaluate(
                model_name,
                format!("fold_{fold}"),
                &test_labels,
                &predicted,
                proba.as_ref(),
            );
            scores.push(bundle.get(metric)?);
        }

        let defined: Vec<f64> = scores.iter().flatten().copied().collect();
        let mean = if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        };
        let std_dev = mean.filter(|_| defined.len() >= 2).map(|m| {
            let ss: f64 = defined.iter().map(|s| (s - m) * (s - m)).sum();
            (ss / (defined.len() - 1) as f64).sqrt()
        });

        tracing::info!(
            model = model_name,
            metric,
            folds = k,
            mean = ?mean,
            std_dev = ?std_dev,
            "cross-validation complete"
        );

        Ok(CvSummary {
            model_name: model_name.to_string(),
            metric: metric.to_string(),
            requested_folds: self.k,
            folds: k,
            scores,
            mean,
            std_dev,
        })
    }
}
