//! Comparison reporting and artifact tables
//!
//! Aggregates metric bundles across models and splits into one wide
//! table, ranks rows by a chosen metric, and writes the CSV artifacts:
//! comparison table, per-document predictions, per-model confusion
//! matrices and cross-validation summaries. Undefined metrics render as
//! `NA`; a row is never dropped because some of its cells are missing.

use std::path::Path;

use serde::Serialize;

use crate::crossval::CvSummary;
use crate::error::PipelineResult;
use crate::metrics::{ConfusionMatrix, MetricBundle, METRIC_COLUMNS};

/// One test-split prediction, as written to the prediction table
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRow {
    pub id: String,
    pub model: String,
    pub actual: String,
    pub predicted: String,
    /// Probability of the predicted class, empty when unsupported
    pub probability: Option<f64>,
}

/// One row of the ranking, best first
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub model_name: String,
    pub split_name: String,
    pub value: Option<f64>,
}

/// Wide table of metric bundles keyed by (model, split)
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    bundles: Vec<MetricBundle>,
}

impl ComparisonReport {
    pub fn new(bundles: Vec<MetricBundle>) -> Self {
        Self { bundles }
    }

    pub fn bundles(&self) -> &[MetricBundle] {
        &self.bundles
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Rank rows by one metric, defined values descending, `NA` last.
    ///
    /// Unknown metric names are an error; bundles where the metric is
    /// undefined stay in the ranking with an empty value.
    pub fn ranking(&self, metric: &str) -> PipelineResult<Vec<RankEntry>> {
        let mut entries = Vec::with_capacity(self.bundles.len());
        for bundle in &self.bundles {
            entries.push(RankEntry {
                model_name: bundle.model_name.clone(),
                split_name: bundle.split_name.clone(),
                value: bundle.get(metric)?,
            });
        }
        entries.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(entries)
    }

    /// Render the table as aligned text for logs and demos.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{:<16} {:<8}", "model", "split"));
        for column in METRIC_COLUMNS {
            out.push_str(&format!(" {column:>17}"));
        }
        out.push('\n');

        for bundle in &self.bundles {
            out.push_str(&format!(
                "{:<16} {:<8}",
                bundle.model_name, bundle.split_name
            ));
            for column in METRIC_COLUMNS {
                let cell = bundle
                    .get(column)
                    .ok()
                    .flatten()
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_else(|| "NA".to_string());
                out.push_str(&format!(" {cell:>17}"));
            }
            out.push('\n');
        }
        out
    }

    /// Write the comparison table as CSV, one row per bundle.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["model".to_string(), "split".to_string()];
        header.extend(METRIC_COLUMNS.iter().map(|c| c.to_string()));
        writer.write_record(&header)?;

        for bundle in &self.bundles {
            let mut record = vec![bundle.model_name.clone(), bundle.split_name.clone()];
            for column in METRIC_COLUMNS {
                record.push(render_cell(bundle.get(column).ok().flatten()));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Write the per-document prediction table.
pub fn write_predictions_csv(
    predictions: &[PredictionRow],
    path: impl AsRef<Path>,
) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "model", "actual", "predicted", "probability"])?;
    for row in predictions {
        let record = [
            row.id.clone(),
            row.model.clone(),
            row.actual.clone(),
            row.predicted.clone(),
            render_cell(row.probability),
        ];
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one confusion matrix as CSV with labeled rows and columns.
/// Rows are actual classes, columns predicted.
pub fn write_confusion_csv(
    matrix: &ConfusionMatrix,
    path: impl AsRef<Path>,
) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["actual".to_string()];
    header.extend(matrix.labels().iter().cloned());
    writer.write_record(&header)?;

    for (r, label) in matrix.labels().iter().enumerate() {
        let mut record = vec![label.clone()];
        for c in 0..matrix.labels().len() {
            record.push(matrix.count(r, c).to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write cross-validation summaries, one row per model family.
pub fn write_cv_csv(summaries: &[CvSummary], path: impl AsRef<Path>) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["model", "metric", "requested_folds", "folds", "mean", "std_dev"])?;
    for summary in summaries {
        let record = [
            summary.model_name.clone(),
            summary.metric.clone(),
            summary.requested_folds.to_string(),
            summary.folds.to_string(),
            render_cell(summary.mean),
            render_cell(summary.std_dev),
        ];
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn render_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_else(|| "NA".to_string())
}
