//! Classification metrics
//!
//! Builds a metric bundle for one (model, split) pair from true and
//! predicted labels. Macro metrics are read from the canonical per-class
//! summary when it has the expected shape and every required field is
//! defined; otherwise they are recomputed manually from the confusion
//! matrix with one-vs-rest counts. Every metric is an `Option<f64>`:
//! undefined stays undefined and renders as `NA`, it is never coerced to
//! zero and never aborts the evaluation.

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::classifiers::ProbabilityMatrix;
use crate::error::{PipelineError, PipelineResult};

/// Metric column names, in report order.
pub const METRIC_COLUMNS: &[&str] = &[
    "accuracy",
    "kappa",
    "sensitivity",
    "specificity",
    "precision",
    "recall",
    "f1",
    "balanced_accuracy",
    "auc",
];

/// Per-class fields a canonical summary must carry to be usable.
const REQUIRED_FIELDS: &[&str] = &["sensitivity", "specificity", "precision", "recall", "f1"];

/// Which path produced the macro-averaged metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Read from the canonical per-class summary structure
    Summary,
    /// Recomputed one-vs-rest from the confusion matrix
    Manual,
}

/// Confusion matrix over the union of actual and predicted label sets
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Array2<u64>,
}

impl ConfusionMatrix {
    /// Count actual/predicted pairs. Labels are the sorted union of both
    /// sides, so a class that was only ever predicted (or only ever
    /// actual) still gets a row and a column.
    pub fn from_pairs(actual: &[String], predicted: &[String]) -> Self {
        let mut labels: Vec<String> = actual.iter().chain(predicted).cloned().collect();
        labels.sort();
        labels.dedup();

        let index: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut counts = Array2::zeros((labels.len(), labels.len()));
        for (a, p) in actual.iter().zip(predicted) {
            counts[[index[a.as_str()], index[p.as_str()]]] += 1;
        }

        Self { labels, counts }
    }

    /// Labels in row/column order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Count of rows with actual label `row` predicted as `col`
    pub fn count(&self, row: usize, col: usize) -> u64 {
        self.counts[[row, col]]
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    /// Actual occurrences of class `c`
    pub fn row_sum(&self, c: usize) -> u64 {
        self.counts.row(c).sum()
    }

    /// Predicted occurrences of class `c`
    pub fn col_sum(&self, c: usize) -> u64 {
        self.counts.column(c).sum()
    }

    /// Fraction of correct predictions, undefined on an empty matrix
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let correct: u64 = (0..self.labels.len()).map(|c| self.counts[[c, c]]).sum();
        Some(correct as f64 / total as f64)
    }

    /// Cohen's kappa, undefined when chance agreement is total
    pub fn kappa(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let po = self.accuracy()?;
        let pe: f64 = (0..self.labels.len())
            .map(|c| self.row_sum(c) as f64 * self.col_sum(c) as f64)
            .sum::<f64>()
            / (total as f64 * total as f64);
        if (1.0 - pe).abs() < f64::EPSILON {
            return None;
        }
        Some((po - pe) / (1.0 - pe))
    }

    /// One-vs-rest counts (TP, FN, FP, TN) for class `c`
    pub fn one_vs_rest(&self, c: usize) -> (u64, u64, u64, u64) {
        let tp = self.counts[[c, c]];
        let fn_ = self.row_sum(c) - tp;
        let fp = self.col_sum(c) - tp;
        let tn = self.total() - tp - fn_ - fp;
        (tp, fn_, fp, tn)
    }

    /// Canonical per-class summary in one of the two upstream shapes:
    /// a per-class table with named metric columns for three or more
    /// labels, or a flat named vector (positive class = first label) for
    /// binary problems. Absent below two labels.
    pub fn class_summary(&self) -> Option<ClassSummary> {
        match self.labels.len() {
            0 | 1 => None,
            2 => {
                let row = class_metrics(self, 0);
                let mut values = BTreeMap::new();
                for (field, value) in [
                    ("sensitivity", row.sensitivity),
                    ("specificity", row.specificity),
                    ("precision", row.precision),
                    ("recall", row.recall),
                    ("f1", row.f1),
                ] {
                    if let Some(v) = value {
                        values.insert(field.to_string(), v);
                    }
                }
                Some(ClassSummary::NamedVector {
                    positive: self.labels[0].clone(),
                    values,
                })
            }
            _ => {
                let rows: Vec<ClassMetrics> = (0..self.labels.len())
                    .map(|c| class_metrics(self, c))
                    .collect();
                let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
                for field in REQUIRED_FIELDS {
                    let column = rows
                        .iter()
                        .map(|row| match *field {
                            "sensitivity" => row.sensitivity,
                            "specificity" => row.specificity,
                            "precision" => row.precision,
                            "recall" => row.recall,
                            _ => row.f1,
                        })
                        .collect();
                    columns.insert(field.to_string(), column);
                }
                Some(ClassSummary::Table {
                    classes: self.labels.clone(),
                    columns,
                })
            }
        }
    }
}

/// Canonical multi-class summary structure
#[derive(Debug, Clone)]
pub enum ClassSummary {
    /// One named metric column per field, one entry per class
    Table {
        classes: Vec<String>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    },
    /// Binary named-vector form; values hold the positive class only
    NamedVector {
        positive: String,
        values: BTreeMap<String, f64>,
    },
}

/// Per-class one-vs-rest metrics; undefined denominators stay `None`
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    pub class: String,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

/// Macro-averaged metric values
#[derive(Debug, Clone, Copy, Default)]
struct MacroMetrics {
    sensitivity: Option<f64>,
    specificity: Option<f64>,
    precision: Option<f64>,
    recall: Option<f64>,
    f1: Option<f64>,
}

/// One point on a one-vs-rest ROC curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC curve and AUC for one class
#[derive(Debug, Clone)]
pub struct ClassRoc {
    pub class: String,
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

/// All metrics for one (model, split) pair
#[derive(Debug, Clone)]
pub struct MetricBundle {
    pub model_name: String,
    pub split_name: String,
    pub accuracy: Option<f64>,
    pub kappa: Option<f64>,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub balanced_accuracy: Option<f64>,
    /// Macro AUC over classes eligible for a ROC curve
    pub auc: Option<f64>,
    pub per_class: Vec<ClassMetrics>,
    pub roc: Vec<ClassRoc>,
    pub confusion: ConfusionMatrix,
    pub source: MetricSource,
}

impl MetricBundle {
    /// Evaluate predictions against true labels.
    ///
    /// Macro metrics resolve through the canonical summary when it is
    /// present, well-shaped and fully defined; any structural mismatch or
    /// undefined required field falls through to the manual one-vs-rest
    /// computation. ROC curves are built per class only when probabilities
    /// are available and the class has both positives and negatives.
    pub fn evaluate(
        model_name: impl Into<String>,
        split_name: impl Into<String>,
        actual: &[String],
        predicted: &[String],
        probabilities: Option<&ProbabilityMatrix>,
    ) -> Self {
        let confusion = ConfusionMatrix::from_pairs(actual, predicted);
        let per_class: Vec<ClassMetrics> = (0..confusion.labels().len())
            .map(|c| class_metrics(&confusion, c))
            .collect();

        let (macro_metrics, source) = match extract_macro(confusion.class_summary().as_ref()) {
            Some(from_summary) => (from_summary, MetricSource::Summary),
            None => (macro_average(&per_class), MetricSource::Manual),
        };

        let balanced_accuracy = match (macro_metrics.sensitivity, macro_metrics.specificity) {
            (Some(sens), Some(spec)) => Some((sens + spec) / 2.0),
            _ => None,
        };

        let roc = probabilities
            .map(|proba| roc_curves(actual, proba))
            .unwrap_or_default();
        let auc = if roc.is_empty() {
            None
        } else {
            Some(roc.iter().map(|r| r.auc).sum::<f64>() / roc.len() as f64)
        };

        Self {
            model_name: model_name.into(),
            split_name: split_name.into(),
            accuracy: confusion.accuracy(),
            kappa: confusion.kappa(),
            sensitivity: macro_metrics.sensitivity,
            specificity: macro_metrics.specificity,
            precision: macro_metrics.precision,
            recall: macro_metrics.recall,
            f1: macro_metrics.f1,
            balanced_accuracy,
            auc,
            per_class,
            roc,
            confusion,
            source,
        }
    }

    /// Look up a metric by its [`METRIC_COLUMNS`] name.
    ///
    /// Unknown names are an error; a known metric that is undefined for
    /// this bundle returns `Ok(None)`.
    pub fn get(&self, metric: &str) -> PipelineResult<Option<f64>> {
        match metric {
            "accuracy" => Ok(self.accuracy),
            "kappa" => Ok(self.kappa),
            "sensitivity" => Ok(self.sensitivity),
            "specificity" => Ok(self.specificity),
            "precision" => Ok(self.precision),
            "recall" => Ok(self.recall),
            "f1" => Ok(self.f1),
            "balanced_accuracy" => Ok(self.balanced_accuracy),
            "auc" => Ok(self.auc),
            other => Err(PipelineError::MetricUndefined(other.to_string())),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Safe ratio: `None` when the denominator is zero.
fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// One-vs-rest metrics for class `c`. A class with no actual occurrences
/// has every metric undefined, even when its rest-side counts exist.
fn class_metrics(matrix: &ConfusionMatrix, c: usize) -> ClassMetrics {
    let class = matrix.labels()[c].clone();
    if matrix.row_sum(c) == 0 {
        return ClassMetrics {
            class,
            sensitivity: None,
            specificity: None,
            precision: None,
            recall: None,
            f1: None,
        };
    }

    let (tp, fn_, fp, tn) = matrix.one_vs_rest(c);
    let sensitivity = ratio(tp, tp + fn_);
    let specificity = ratio(tn, tn + fp);
    let precision = ratio(tp, tp + fp);
    let recall = sensitivity;
    let f1 = derive_f1(precision, recall);

    ClassMetrics {
        class,
        sensitivity,
        specificity,
        precision,
        recall,
        f1,
    }
}

/// F1 from precision and recall, defined only when both are defined and
/// their sum is positive.
fn derive_f1(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    match (precision, recall) {
        (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
        _ => None,
    }
}

/// Average the defined entries; `None` when every entry is undefined.
/// Classes where a metric's denominator was zero contribute nothing, they
/// are never treated as zero.
fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Manual macro averaging over per-class rows.
fn macro_average(rows: &[ClassMetrics]) -> MacroMetrics {
    let precision = mean_defined(rows.iter().map(|r| r.precision));
    let recall = mean_defined(rows.iter().map(|r| r.recall));
    MacroMetrics {
        sensitivity: mean_defined(rows.iter().map(|r| r.sensitivity)),
        specificity: mean_defined(rows.iter().map(|r| r.specificity)),
        precision,
        recall,
        f1: derive_f1(precision, recall),
    }
}

/// Strict extraction from the canonical summary. Returns `None` (forcing
/// the manual path) when the summary is absent, a required field is
/// missing or undefined, or a column length disagrees with the class
/// list. The macro F1 is always rederived from the macro precision and
/// recall so the bundle's F1 invariant holds on either path.
fn extract_macro(summary: Option<&ClassSummary>) -> Option<MacroMetrics> {
    let summary = summary?;
    let mut out = MacroMetrics::default();

    match summary {
        ClassSummary::Table { classes, columns } => {
            for field in REQUIRED_FIELDS {
                let column = columns.get(*field)?;
                if column.len() != classes.len() {
                    return None;
                }
                let defined: Option<Vec<f64>> = column.iter().copied().collect();
                let values = defined?;
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                assign(&mut out, field, mean);
            }
        }
        ClassSummary::NamedVector { values, .. } => {
            for field in REQUIRED_FIELDS {
                let value = *values.get(*field)?;
                assign(&mut out, field, value);
            }
        }
    }

    out.f1 = derive_f1(out.precision, out.recall);
    Some(out)
}

fn assign(out: &mut MacroMetrics, field: &str, value: f64) {
    match field {
        "sensitivity" => out.sensitivity = Some(value),
        "specificity" => out.specificity = Some(value),
        "precision" => out.precision = Some(value),
        "recall" => out.recall = Some(value),
        _ => out.f1 = Some(value),
    }
}

/// One-vs-rest ROC curves for every eligible class.
///
/// A class is eligible when the split contains at least one positive and
/// one negative example for it and the model exposes a probability
/// column; anything else is skipped, never defaulted.
fn roc_curves(actual: &[String], probabilities: &ProbabilityMatrix) -> Vec<ClassRoc> {
    let mut curves = Vec::new();
    for class in &probabilities.classes {
        let positives = actual.iter().filter(|a| *a == class).count();
        if positives == 0 || positives == actual.len() {
            continue;
        }
        let Some(scores) = probabilities.class_column(class) else {
            continue;
        };
        if scores.len() != actual.len() {
            continue;
        }

        let targets: Vec<bool> = actual.iter().map(|a| a == class).collect();
        let points = roc_points(&scores, &targets);
        let auc = trapezoid_auc(&points);
        curves.push(ClassRoc {
            class: class.clone(),
            points,
            auc,
        });
    }
    curves
}

/// Sweep thresholds over the distinct scores, highest first, collecting
/// (FPR, TPR) points from (0, 0) to (1, 1).
fn roc_points(scores: &[f64], targets: &[bool]) -> Vec<RocPoint> {
    let total_pos = targets.iter().filter(|&&t| t).count() as f64;
    let total_neg = targets.len() as f64 - total_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0 }];
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < order.len() {
        // Tied scores move together so the curve never depends on the
        // incidental order of equal predictions.
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if targets[order[i]] {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        points.push(RocPoint {
            fpr: fp / total_neg,
            tpr: tp / total_pos,
        });
    }
    points
}

fn trapezoid_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[0].tpr + w[1].tpr) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_confusion_matrix_unions_label_sets() {
        let actual = labels(&["left", "left", "right"]);
        let predicted = labels(&["left", "center", "right"]);
        let matrix = ConfusionMatrix::from_pairs(&actual, &predicted);

        assert_eq!(matrix.labels(), &["center", "left", "right"]);
        assert_eq!(matrix.total(), 3);
        // "center" was predicted once but never actual.
        assert_eq!(matrix.row_sum(0), 0);
        assert_eq!(matrix.col_sum(0), 1);
        assert_eq!(matrix.count(1, 0), 1);
    }

    #[test]
    fn test_accuracy_and_kappa() {
        let actual = labels(&["a", "a", "b", "b"]);
        let predicted = labels(&["a", "a", "b", "a"]);
        let matrix = ConfusionMatrix::from_pairs(&actual, &predicted);

        assert_eq!(matrix.accuracy(), Some(0.75));
        // po = 0.75, pe = (2*3 + 2*1)/16 = 0.5, kappa = 0.5.
        assert!((matrix.kappa().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_undefined_at_total_chance_agreement() {
        let actual = labels(&["a", "a"]);
        let predicted = labels(&["a", "a"]);
        let matrix = ConfusionMatrix::from_pairs(&actual, &predicted);
        assert_eq!(matrix.accuracy(), Some(1.0));
        assert!(matrix.kappa().is_none());
    }

    #[test]
    fn test_one_vs_rest_counts() {
        // actual a: predicted a,a,b; actual b: predicted b,b; actual c: a
        let actual = labels(&["a", "a", "a", "b", "b", "c"]);
        let predicted = labels(&["a", "a", "b", "b", "b", "a"]);
        let matrix = ConfusionMatrix::from_pairs(&actual, &predicted);

        let (tp, fn_, fp, tn) = matrix.one_vs_rest(0);
        assert_eq!((tp, fn_, fp, tn), (2, 1, 1, 2));
        let (tp, fn_, fp, tn) = matrix.one_vs_rest(2);
        assert_eq!((tp, fn_, fp, tn), (0, 1, 0, 5));
    }

    #[test]
    fn test_summary_path_matches_manual_on_fully_defined_matrix() {
        let actual = labels(&["a", "a", "b", "b", "c", "c"]);
        let predicted = labels(&["a", "b", "b", "b", "c", "a"]);

        let bundle = MetricBundle::evaluate("m", "test", &actual, &predicted, None);
        assert_eq!(bundle.source, MetricSource::Summary);

        let manual = macro_average(&bundle.per_class);
        assert_eq!(bundle.sensitivity, manual.sensitivity);
        assert_eq!(bundle.specificity, manual.specificity);
        assert_eq!(bundle.precision, manual.precision);
    }

    #[test]
    fn test_absent_class_forces_manual_fallback_with_na_row() {
        // Three known classes but "center" never appears in the test
        // split's actuals, so its per-class row is fully undefined.
        let actual = labels(&["left", "left", "right", "right"]);
        let predicted = labels(&["left", "center", "right", "right"]);

        let bundle = MetricBundle::evaluate("m", "test", &actual, &predicted, None);
        assert_eq!(bundle.source, MetricSource::Manual);

        let center = bundle
            .per_class
            .iter()
            .find(|r| r.class == "center")
            .unwrap();
        assert!(center.sensitivity.is_none());
        assert!(center.specificity.is_none());
        assert!(center.precision.is_none());
        assert!(center.f1.is_none());

        // The macro average still exists, built from the defined classes.
        assert!(bundle.sensitivity.is_some());
        assert!(bundle.balanced_accuracy.is_some());
    }

    #[test]
    fn test_macro_average_skips_undefined_entries() {
        let rows = vec![
            ClassMetrics {
                class: "a".to_string(),
                sensitivity: Some(1.0),
                specificity: Some(0.5),
                precision: Some(0.8),
                recall: Some(1.0),
                f1: None,
            },
            ClassMetrics {
                class: "b".to_string(),
                sensitivity: Some(0.5),
                specificity: None,
                precision: None,
                recall: Some(0.5),
                f1: None,
            },
        ];

        let macro_metrics = macro_average(&rows);
        assert_eq!(macro_metrics.sensitivity, Some(0.75));
        // The undefined entries are skipped, not averaged as zero.
        assert_eq!(macro_metrics.specificity, Some(0.5));
        assert_eq!(macro_metrics.precision, Some(0.8));
    }

    #[test]
    fn test_balanced_accuracy_and_f1_invariants() {
        let actual = labels(&["a", "a", "a", "b", "b", "c", "c", "c"]);
        let predicted = labels(&["a", "a", "b", "b", "a", "c", "c", "b"]);
        let bundle = MetricBundle::evaluate("m", "test", &actual, &predicted, None);

        let expected_ba = (bundle.sensitivity.unwrap() + bundle.specificity.unwrap()) / 2.0;
        assert!((bundle.balanced_accuracy.unwrap() - expected_ba).abs() < 1e-12);

        let p = bundle.precision.unwrap();
        let r = bundle.recall.unwrap();
        assert!((bundle.f1.unwrap() - 2.0 * p * r / (p + r)).abs() < 1e-12);
    }

    #[test]
    fn test_f1_undefined_when_precision_or_recall_missing() {
        assert!(derive_f1(None, Some(0.5)).is_none());
        assert!(derive_f1(Some(0.5), None).is_none());
        assert!(derive_f1(Some(0.0), Some(0.0)).is_none());
        assert!(derive_f1(Some(0.5), Some(0.5)).is_some());
    }

    #[test]
    fn test_extract_rejects_malformed_summaries() {
        // A table whose column length disagrees with its class list.
        let mut columns = BTreeMap::new();
        for field in REQUIRED_FIELDS {
            columns.insert(field.to_string(), vec![Some(0.5)]);
        }
        let summary = ClassSummary::Table {
            classes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            columns,
        };
        assert!(extract_macro(Some(&summary)).is_none());

        // A named vector missing a required field.
        let summary = ClassSummary::NamedVector {
            positive: "a".to_string(),
            values: BTreeMap::from([("sensitivity".to_string(), 1.0)]),
        };
        assert!(extract_macro(Some(&summary)).is_none());

        assert!(extract_macro(None).is_none());
    }

    #[test]
    fn test_binary_summary_uses_positive_class_vector() {
        let actual = labels(&["a", "a", "b", "b"]);
        let predicted = labels(&["a", "b", "b", "b"]);
        let matrix = ConfusionMatrix::from_pairs(&actual, &predicted);

        match matrix.class_summary().unwrap() {
            ClassSummary::NamedVector { positive, values } => {
                assert_eq!(positive, "a");
                assert_eq!(values["sensitivity"], 0.5);
                assert_eq!(values["specificity"], 1.0);
            }
            other => panic!("expected named vector, got {other:?}"),
        }
    }

    #[test]
    fn test_roc_perfect_separation_has_unit_auc() {
        let actual = labels(&["a", "a", "b", "b"]);
        let proba = ProbabilityMatrix {
            classes: labels(&["a", "b"]),
            values: array![[0.9, 0.1], [0.8, 0.2], [0.2, 0.8], [0.1, 0.9]],
        };

        let curves = roc_curves(&actual, &proba);
        assert_eq!(curves.len(), 2);
        for curve in &curves {
            assert!((curve.auc - 1.0).abs() < 1e-12);
            assert_eq!(curve.points.first(), Some(&RocPoint { fpr: 0.0, tpr: 0.0 }));
            assert_eq!(curve.points.last(), Some(&RocPoint { fpr: 1.0, tpr: 1.0 }));
        }
    }

    #[test]
    fn test_roc_skips_classes_without_both_outcomes() {
        // Every actual is "a": no negatives for "a", no positives for "b".
        let actual = labels(&["a", "a"]);
        let proba = ProbabilityMatrix {
            classes: labels(&["a", "b"]),
            values: array![[0.6, 0.4], [0.7, 0.3]],
        };
        assert!(roc_curves(&actual, &proba).is_empty());

        let bundle = MetricBundle::evaluate("m", "test", &actual, &actual, Some(&proba));
        assert!(bundle.auc.is_none());
    }

    #[test]
    fn test_random_scores_give_half_auc() {
        // A constant score ranks everything together: one diagonal step.
        let points = roc_points(&[0.5, 0.5, 0.5, 0.5], &[true, false, true, false]);
        assert!((trapezoid_auc(&points) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metric_lookup_by_name() {
        let actual = labels(&["a", "a", "b", "b"]);
        let bundle = MetricBundle::evaluate("m", "test", &actual, &actual, None);

        assert_eq!(bundle.get("accuracy").unwrap(), Some(1.0));
        assert!(bundle.get("auc").unwrap().is_none());
        assert!(bundle.get("lift").is_err());
    }
}
