//! Random forest classifier
//!
//! Bootstrap-bagged CART trees with Gini splits over a sampled feature
//! subset per node. Probabilities are vote fractions across trees and
//! feature importances are mean impurity decreases, normalized to sum to
//! one. Tree building parallelizes with rayon; every tree derives its own
//! seed from the run seed so results do not depend on scheduling.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

use super::{ensure_trainable, Classifier, ProbabilityMatrix};

pub const MODEL_NAME: &str = "random_forest";

/// Nodes with fewer rows than this become leaves.
const MIN_SPLIT_SAMPLES: usize = 2;

/// Split gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

/// One node of a fitted tree, stored in a flat arena
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART tree over class indices
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl DecisionTree {
    fn predict_row(&self, row: ArrayView1<f64>) -> usize {
        let mut at = self.root;
        loop {
            match &self.nodes[at] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
    feature_dim: usize,
}

/// Serialized form of a [`RandomForestClassifier`]
#[derive(Debug, Serialize, Deserialize)]
struct RandomForestModelData {
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
    feature_dim: usize,
}

impl RandomForestClassifier {
    /// Train the forest on a feature matrix and label vector.
    ///
    /// Each tree fits a bootstrap resample of the training rows; splits
    /// consider `split_candidates` features drawn per node (default
    /// ⌈√d⌉). Tree `i` seeds its generator with `seed + i`, so the same
    /// inputs always grow the same forest regardless of thread count.
    pub fn train(
        features: &Array2<f64>,
        labels: &[String],
        config: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let classes = ensure_trainable(features, labels, MODEL_NAME)?;
        let dim = features.ncols();
        if dim == 0 {
            return Err(PipelineError::training(MODEL_NAME, "empty feature matrix"));
        }

        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.iter().position(|c| c == l).unwrap_or(0))
            .collect();
        let mtry = config
            .split_candidates
            .unwrap_or_else(|| (dim as f64).sqrt().ceil() as usize)
            .clamp(1, dim);

        let grown: Vec<(DecisionTree, Vec<f64>)> = (0..config.tree_count)
            .into_par_iter()
            .map(|i| {
                let mut builder = TreeBuilder {
                    features,
                    targets: &targets,
                    class_count: classes.len(),
                    mtry,
                    max_depth: config.max_tree_depth,
                    total_rows: features.nrows(),
                    rng: StdRng::seed_from_u64(config.seed.wrapping_add(i as u64)),
                    nodes: Vec::new(),
                    importances: vec![0.0; dim],
                };
                let tree = builder.grow();
                (tree, builder.importances)
            })
            .collect();

        let mut trees = Vec::with_capacity(grown.len());
        let mut importances = vec![0.0; dim];
        for (tree, tree_importance) in grown {
            for (acc, value) in importances.iter_mut().zip(&tree_importance) {
                *acc += value;
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        tracing::info!(
            trees = trees.len(),
            classes = classes.len(),
            rows = features.nrows(),
            mtry,
            "trained random forest"
        );

        Ok(Self {
            classes,
            trees,
            importances,
            feature_dim: dim,
        })
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let data: RandomForestModelData = serde_json::from_str(json)?;
        if data.trees.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "model file contains no trees".to_string(),
            ));
        }
        Ok(Self {
            classes: data.classes,
            trees: data.trees,
            importances: data.importances,
            feature_dim: data.feature_dim,
        })
    }

    /// Per-row vote counts over classes
    fn votes(&self, features: &Array2<f64>) -> Vec<Vec<usize>> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                let mut counts = vec![0usize; self.classes.len()];
                for tree in &self.trees {
                    counts[tree.predict_row(row)] += 1;
                }
                counts
            })
            .collect()
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &Array2<f64>) -> Vec<String> {
        self.votes(features)
            .into_iter()
            .map(|counts| {
                // Ties break toward the first class in sorted order.
                let mut best = 0;
                for (k, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = k;
                    }
                }
                self.classes[best].clone()
            })
            .collect()
    }

    fn supports_probabilities(&self) -> bool {
        true
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Option<ProbabilityMatrix> {
        let votes = self.votes(features);
        let n_trees = self.trees.len().max(1) as f64;
        let mut values = Array2::zeros((votes.len(), self.classes.len()));
        for (i, counts) in votes.iter().enumerate() {
            for (j, &count) in counts.iter().enumerate() {
                values[[i, j]] = count as f64 / n_trees;
            }
        }
        Some(ProbabilityMatrix {
            classes: self.classes.clone(),
            values,
        })
    }

    fn feature_importance(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }

    fn to_json(&self) -> PipelineResult<String> {
        let data = RandomForestModelData {
            classes: self.classes.clone(),
            trees: self.trees.clone(),
            importances: self.importances.clone(),
            feature_dim: self.feature_dim,
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

/// Grows one tree on a bootstrap resample
struct TreeBuilder<'a> {
    features: &'a Array2<f64>,
    targets: &'a [usize],
    class_count: usize,
    mtry: usize,
    max_depth: Option<usize>,
    total_rows: usize,
    rng: StdRng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    fn grow(&mut self) -> DecisionTree {
        let n = self.features.nrows();
        let rows: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..n)).collect();
        let root = self.build(&rows, 0);
        DecisionTree {
            nodes: std::mem::take(&mut self.nodes),
            root,
        }
    }

    fn build(&mut self, rows: &[usize], depth: usize) -> usize {
        let counts = self.count_classes(rows);
        let node_gini = gini(&counts, rows.len());
        let depth_capped = self.max_depth.is_some_and(|d| depth >= d);

        if rows.len() < MIN_SPLIT_SAMPLES || node_gini <= 0.0 || depth_capped {
            return self.push_leaf(&counts);
        }

        let Some(split) = self.best_split(rows, node_gini) else {
            return self.push_leaf(&counts);
        };

        self.importances[split.feature] +=
            rows.len() as f64 / self.total_rows as f64 * split.gain;

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| self.features[[r, split.feature]] <= split.threshold);
        let left = self.build(&left_rows, depth + 1);
        let right = self.build(&right_rows, depth + 1);

        self.nodes.push(TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    fn push_leaf(&mut self, counts: &[usize]) -> usize {
        let mut class = 0;
        for (k, &count) in counts.iter().enumerate() {
            if count > counts[class] {
                class = k;
            }
        }
        self.nodes.push(TreeNode::Leaf { class });
        self.nodes.len() - 1
    }

    fn count_classes(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.class_count];
        for &r in rows {
            counts[self.targets[r]] += 1;
        }
        counts
    }

    /// Exhaustive threshold sweep over a sampled feature subset.
    fn best_split(&mut self, rows: &[usize], node_gini: f64) -> Option<BestSplit> {
        let dim = self.features.ncols();
        let candidates = rand::seq::index::sample(&mut self.rng, dim, self.mtry.min(dim));
        let n = rows.len();
        let mut best: Option<BestSplit> = None;

        for feature in candidates {
            let mut ordered: Vec<(f64, usize)> = rows
                .iter()
                .map(|&r| (self.features[[r, feature]], self.targets[r]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; self.class_count];
            let mut right_counts = self.count_classes(rows);

            for i in 1..n {
                let (value, class) = ordered[i - 1];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next_value = ordered[i].0;
                if next_value <= value {
                    continue;
                }

                let weight_left = i as f64 / n as f64;
                let gain = node_gini
                    - weight_left * gini(&left_counts, i)
                    - (1.0 - weight_left) * gini(&right_counts, n - i);
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}
