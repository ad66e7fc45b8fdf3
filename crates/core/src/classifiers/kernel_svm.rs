//! Kernel SVM classifier
//!
//! One-vs-rest support vector machine built on linfa-svm. Features are
//! standardized before fitting. Decision functions are extracted from the
//! fitted models so inference has no dependency on the training dataset:
//!
//! - Linear kernel: f(x) = w·x - rho
//! - RBF kernel: f(x) = Σ(αᵢ·exp(-γ||x-xᵢ||²)) - rho
//!
//! Probability estimates are opt-in at construction time; when requested,
//! a Platt scaler is fitted per class on the training decision values and
//! per-row probabilities are normalized to sum to one.

use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::config::{KernelKind, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::features::StandardScaler;

use super::{ensure_trainable, Classifier, ProbabilityMatrix};

pub const MODEL_NAME: &str = "kernel_svm";

/// One one-vs-rest member of the multi-class model
#[derive(Debug, Clone)]
enum BinaryMember {
    Linear {
        weights: Array1<f64>,
        rho: f64,
    },
    Rbf {
        alpha: Vec<f64>,
        support_vectors: Array2<f64>,
        rho: f64,
        gamma: f64,
    },
}

impl BinaryMember {
    fn decision(&self, x: ArrayView1<f64>) -> f64 {
        match self {
            BinaryMember::Linear { weights, rho } => weights.dot(&x) - rho,
            BinaryMember::Rbf {
                alpha,
                support_vectors,
                rho,
                gamma,
            } => {
                let mut sum = 0.0;
                for (i, alpha_i) in alpha.iter().enumerate() {
                    let sq_dist: f64 = support_vectors
                        .row(i)
                        .iter()
                        .zip(x.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    sum += alpha_i * (-gamma * sq_dist).exp();
                }
                sum - rho
            }
        }
    }
}

/// Sigmoid calibration of raw decision values into probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlattScaler {
    slope: f64,
    intercept: f64,
}

impl PlattScaler {
    const ITERATIONS: usize = 500;
    const LEARNING_RATE: f64 = 0.1;

    /// Fit the sigmoid by gradient descent on the logistic loss.
    fn fit(scores: &[f64], targets: &[bool]) -> Self {
        let n = scores.len().max(1) as f64;
        let mut slope = 1.0;
        let mut intercept = 0.0;

        for _ in 0..Self::ITERATIONS {
            let mut g_slope = 0.0;
            let mut g_intercept = 0.0;
            for (&score, &target) in scores.iter().zip(targets) {
                let err = sigmoid(slope * score + intercept) - if target { 1.0 } else { 0.0 };
                g_slope += err * score;
                g_intercept += err;
            }
            slope -= Self::LEARNING_RATE * g_slope / n;
            intercept -= Self::LEARNING_RATE * g_intercept / n;
        }

        Self { slope, intercept }
    }

    fn probability(&self, score: f64) -> f64 {
        sigmoid(self.slope * score + self.intercept)
    }
}

/// Multi-class kernel SVM with one binary model per class
#[derive(Debug, Clone)]
pub struct KernelSvmClassifier {
    kernel: KernelKind,
    cost: f64,
    gamma: f64,
    probability: bool,
    classes: Vec<String>,
    scaler: StandardScaler,
    members: Vec<BinaryMember>,
    platt: Vec<Option<PlattScaler>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinearMemberData {
    class: String,
    weights: Vec<f64>,
    rho: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RbfMemberData {
    class: String,
    alpha: Vec<f64>,
    support_vectors: Vec<Vec<f64>>,
    rho: f64,
    gamma: f64,
}

/// Serialized form of a [`KernelSvmClassifier`]
#[derive(Debug, Serialize, Deserialize)]
struct KernelSvmModelData {
    kernel: KernelKind,
    cost: f64,
    gamma: f64,
    probability: bool,
    classes: Vec<String>,
    scaler: StandardScaler,
    #[serde(default)]
    linear_members: Vec<LinearMemberData>,
    #[serde(default)]
    rbf_members: Vec<RbfMemberData>,
    platt: Vec<Option<PlattScaler>>,
}

impl KernelSvmClassifier {
    /// Train one-vs-rest SVMs on a standardized copy of the features.
    pub fn train(
        features: &Array2<f64>,
        labels: &[String],
        config: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let classes = ensure_trainable(features, labels, MODEL_NAME)?;
        let (scaler, scaled) = StandardScaler::fit_transform(features);

        let mut members = Vec::with_capacity(classes.len());
        for class in &classes {
            let targets: Vec<bool> = labels.iter().map(|l| l == class).collect();
            let dataset = Dataset::new(scaled.clone(), Array1::from_vec(targets));

            let fitted = match config.kernel {
                KernelKind::Linear => Svm::<_, bool>::params()
                    .pos_neg_weights(config.svm_cost, config.svm_cost)
                    .linear_kernel()
                    .fit(&dataset),
                KernelKind::Rbf => Svm::<_, bool>::params()
                    .pos_neg_weights(config.svm_cost, config.svm_cost)
                    .gaussian_kernel(config.svm_gamma)
                    .fit(&dataset),
            };
            let svm = fitted.map_err(|e| {
                PipelineError::training(MODEL_NAME, format!("fitting class {class}: {e}"))
            })?;

            let member = match config.kernel {
                KernelKind::Linear => {
                    // w = Σ(αᵢ·xᵢ) over the training rows
                    let mut weights = Array1::zeros(scaled.ncols());
                    for (i, &alpha_i) in svm.alpha.iter().enumerate() {
                        weights = weights + &(scaled.row(i).to_owned() * alpha_i);
                    }
                    BinaryMember::Linear {
                        weights,
                        rho: svm.rho,
                    }
                }
                KernelKind::Rbf => BinaryMember::Rbf {
                    alpha: svm.alpha.clone(),
                    support_vectors: scaled.clone(),
                    rho: svm.rho,
                    gamma: config.svm_gamma,
                },
            };
            members.push(member);
        }

        // Calibrate on training decision values when probabilities were
        // requested; they cannot be recovered after the fact.
        let platt: Vec<Option<PlattScaler>> = if config.svm_probability {
            classes
                .iter()
                .zip(&members)
                .map(|(class, member)| {
                    let scores: Vec<f64> = scaled
                        .rows()
                        .into_iter()
                        .map(|row| member.decision(row))
                        .collect();
                    let targets: Vec<bool> = labels.iter().map(|l| l == class).collect();
                    Some(PlattScaler::fit(&scores, &targets))
                })
                .collect()
        } else {
            vec![None; classes.len()]
        };

        tracing::info!(
            classes = classes.len(),
            kernel = ?config.kernel,
            rows = features.nrows(),
            "trained kernel svm"
        );

        Ok(Self {
            kernel: config.kernel,
            cost: config.svm_cost,
            gamma: config.svm_gamma,
            probability: config.svm_probability,
            classes,
            scaler,
            members,
            platt,
        })
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let data: KernelSvmModelData = serde_json::from_str(json)?;
        let member_count = data.linear_members.len() + data.rbf_members.len();
        if member_count != data.classes.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "model file has {member_count} members for {} classes",
                data.classes.len()
            )));
        }

        let mut members = Vec::with_capacity(member_count);
        match data.kernel {
            KernelKind::Linear => {
                for (m, class) in data.linear_members.into_iter().zip(&data.classes) {
                    if &m.class != class {
                        return Err(PipelineError::InvalidConfig(format!(
                            "model member order mismatch: expected {class}, found {}",
                            m.class
                        )));
                    }
                    members.push(BinaryMember::Linear {
                        weights: Array1::from_vec(m.weights),
                        rho: m.rho,
                    });
                }
            }
            KernelKind::Rbf => {
                for (m, class) in data.rbf_members.into_iter().zip(&data.classes) {
                    if &m.class != class {
                        return Err(PipelineError::InvalidConfig(format!(
                            "model member order mismatch: expected {class}, found {}",
                            m.class
                        )));
                    }
                    let n = m.support_vectors.len();
                    let dim = m.support_vectors.first().map(|v| v.len()).unwrap_or(0);
                    let flat: Vec<f64> = m.support_vectors.into_iter().flatten().collect();
                    let support_vectors = Array2::from_shape_vec((n, dim), flat)
                        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
                    members.push(BinaryMember::Rbf {
                        alpha: m.alpha,
                        support_vectors,
                        rho: m.rho,
                        gamma: m.gamma,
                    });
                }
            }
        }

        Ok(Self {
            kernel: data.kernel,
            cost: data.cost,
            gamma: data.gamma,
            probability: data.probability,
            classes: data.classes,
            scaler: data.scaler,
            members,
            platt: data.platt,
        })
    }

    fn decision_row(&self, row: ArrayView1<f64>) -> Vec<f64> {
        self.members.iter().map(|m| m.decision(row)).collect()
    }
}

impl Classifier for KernelSvmClassifier {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &Array2<f64>) -> Vec<String> {
        let scaled = self.scaler.transform(features);
        scaled
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                let mut best_score = f64::NEG_INFINITY;
                for (k, score) in self.decision_row(row).into_iter().enumerate() {
                    if score > best_score {
                        best_score = score;
                        best = k;
                    }
                }
                self.classes[best].clone()
            })
            .collect()
    }

    fn supports_probabilities(&self) -> bool {
        self.probability
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Option<ProbabilityMatrix> {
        if !self.probability {
            return None;
        }

        let scaled = self.scaler.transform(features);
        let k = self.classes.len();
        let mut values = Array2::zeros((scaled.nrows(), k));

        for (i, row) in scaled.rows().into_iter().enumerate() {
            let mut sum = 0.0;
            for (j, (member, platt)) in self.members.iter().zip(&self.platt).enumerate() {
                let p = platt
                    .as_ref()
                    .map(|pl| pl.probability(member.decision(row)))
                    .unwrap_or(0.0);
                values[[i, j]] = p;
                sum += p;
            }
            if sum > 0.0 {
                for j in 0..k {
                    values[[i, j]] /= sum;
                }
            } else {
                for j in 0..k {
                    values[[i, j]] = 1.0 / k as f64;
                }
            }
        }

        Some(ProbabilityMatrix {
            classes: self.classes.clone(),
            values,
        })
    }

    fn to_json(&self) -> PipelineResult<String> {
        let mut linear_members = Vec::new();
        let mut rbf_members = Vec::new();
        for (class, member) in self.classes.iter().zip(&self.members) {
            match member {
                BinaryMember::Linear { weights, rho } => linear_members.push(LinearMemberData {
                    class: class.clone(),
                    weights: weights.to_vec(),
                    rho: *rho,
                }),
                BinaryMember::Rbf {
                    alpha,
                    support_vectors,
                    rho,
                    gamma,
                } => rbf_members.push(RbfMemberData {
                    class: class.clone(),
                    alpha: alpha.clone(),
                    support_vectors: support_vectors
                        .rows()
                        .into_iter()
                        .map(|r| r.to_vec())
                        .collect(),
                    rho: *rho,
                    gamma: *gamma,
                }),
            }
        }

        let data = KernelSvmModelData {
            kernel: self.kernel,
            cost: self.cost,
            gamma: self.gamma,
            probability: self.probability,
            classes: self.classes.clone(),
            scaler: self.scaler.clone(),
            linear_members,
            rbf_members,
            platt: self.platt.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    fn clone_box(&self) -> Box<dyn Classifier> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Two well-separated clusters, 30 rows each.
    fn clustered_data() -> (Array2<f64>, Vec<String>) {
        let dim = 4;
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            for d in 0..dim {
                rows.push(0.0 + ((i + d) % 5) as f64 * 0.02);
            }
            labels.push("left".to_string());
        }
        for i in 0..30 {
            for d in 0..dim {
                rows.push(5.0 + ((i + d) % 5) as f64 * 0.02);
            }
            labels.push("right".to_string());
        }
        let features = Array2::from_shape_vec((60, dim), rows).unwrap();
        (features, labels)
    }

    fn probes() -> Array2<f64> {
        ndarray::array![[0.05, 0.05, 0.05, 0.05], [5.05, 5.05, 5.05, 5.05]]
    }

    #[test]
    fn test_linear_kernel_separates_clusters() {
        let (features, labels) = clustered_data();
        let config = PipelineConfig::new();
        let model = KernelSvmClassifier::train(&features, &labels, &config).unwrap();

        assert_eq!(model.classes(), &["left".to_string(), "right".to_string()]);
        assert_eq!(model.predict(&probes()), vec!["left", "right"]);
    }

    #[test]
    fn test_rbf_kernel_separates_clusters() {
        let (features, labels) = clustered_data();
        let config = PipelineConfig::new().with_kernel(KernelKind::Rbf);
        let model = KernelSvmClassifier::train(&features, &labels, &config).unwrap();

        assert_eq!(model.predict(&probes()), vec!["left", "right"]);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (features, labels) = clustered_data();
        let config = PipelineConfig::new();
        let a = KernelSvmClassifier::train(&features, &labels, &config).unwrap();
        let b = KernelSvmClassifier::train(&features, &labels, &config).unwrap();

        let wide: Array2<f64> = features.clone();
        assert_eq!(a.predict(&wide), b.predict(&wide));
    }

    #[test]
    fn test_probabilities_sum_to_one_and_track_predictions() {
        let (features, labels) = clustered_data();
        let config = PipelineConfig::new();
        let model = KernelSvmClassifier::train(&features, &labels, &config).unwrap();

        assert!(model.supports_probabilities());
        let proba = model.predict_proba(&probes()).unwrap();
        for i in 0..2 {
            let row_sum: f64 = proba.values.row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-9);
        }

        // The predicted class carries the largest probability.
        let predictions = model.predict(&probes());
        for (i, predicted) in predictions.iter().enumerate() {
            let row = proba.values.row(i);
            let best = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(j, _)| j)
                .unwrap();
            assert_eq!(&proba.classes[best], predicted);
        }
    }

    #[test]
    fn test_probability_opt_out() {
        let (features, labels) = clustered_data();
        let config = PipelineConfig::new().with_svm_probability(false);
        let model = KernelSvmClassifier::train(&features, &labels, &config).unwrap();

        assert!(!model.supports_probabilities());
        assert!(model.predict_proba(&probes()).is_none());
    }

    #[test]
    fn test_refuses_insufficient_training_data() {
        let features = Array2::zeros((20, 4));
        let labels: Vec<String> = (0..20)
            .map(|i| if i % 2 == 0 { "left" } else { "right" })
            .map(str::to_string)
            .collect();
        let config = PipelineConfig::new();
        assert!(KernelSvmClassifier::train(&features, &labels, &config).is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_predictions() {
        let (features, labels) = clustered_data();
        for kernel in [KernelKind::Linear, KernelKind::Rbf] {
            let config = PipelineConfig::new().with_kernel(kernel);
            let model = KernelSvmClassifier::train(&features, &labels, &config).unwrap();
            let json = model.to_json().unwrap();
            let restored = KernelSvmClassifier::from_json(&json).unwrap();

            assert_eq!(restored.classes(), model.classes());
            assert_eq!(restored.predict(&probes()), model.predict(&probes()));
        }
    }
}
