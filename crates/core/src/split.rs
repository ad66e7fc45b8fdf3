//! Train/test partitioning
//!
//! Seeded, label-stratified splitting of document indices, with an
//! unstratified fallback when any class is too small to stratify. Fold
//! construction for cross-validation lives here as well.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, PipelineResult};

/// Disjoint train/test index sets over one labeled dataset
#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    /// False when a small class forced the unstratified fallback
    pub stratified: bool,
}

impl SplitIndices {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }
}

/// Split labeled rows into train and test index sets.
///
/// When every class has at least two members the split is stratified:
/// each class is shuffled and divided so its train share approximates
/// `train_fraction`, with both sides keeping at least one member. When
/// some class has a single member the whole dataset is shuffled and
/// split unstratified instead, and the result is flagged.
pub fn train_test_split(
    labels: &[String],
    train_fraction: f64,
    seed: u64,
) -> PipelineResult<SplitIndices> {
    if labels.len() < 2 {
        return Err(PipelineError::DegenerateSplit(format!(
            "cannot split {} row(s) into train and test",
            labels.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let by_class = group_by_label(labels);
    let stratified = by_class.values().all(|members| members.len() >= 2);

    let mut train = Vec::new();
    let mut test = Vec::new();

    if stratified {
        for members in by_class.into_values() {
            let mut members = members;
            members.shuffle(&mut rng);
            let n_train = train_count(members.len(), train_fraction);
            train.extend_from_slice(&members[..n_train]);
            test.extend_from_slice(&members[n_train..]);
        }
    } else {
        tracing::warn!(
            classes = by_class.len(),
            "a class has fewer than two members, falling back to unstratified split"
        );
        let mut all: Vec<usize> = (0..labels.len()).collect();
        all.shuffle(&mut rng);
        let n_train = train_count(all.len(), train_fraction);
        train.extend_from_slice(&all[..n_train]);
        test.extend_from_slice(&all[n_train..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    Ok(SplitIndices {
        train,
        test,
        stratified,
    })
}

/// Build `k` cross-validation folds of held-out row indices.
///
/// Each class's rows are shuffled and dealt round-robin across folds so
/// class proportions stay approximately even. The dealing position
/// carries over between classes, keeping fold sizes within one of each
/// other even when many classes are smaller than `k`. Every row lands in
/// exactly one fold.
pub fn stratified_folds(labels: &[String], k: usize, seed: u64) -> PipelineResult<Vec<Vec<usize>>> {
    if k < 2 || k > labels.len() {
        return Err(PipelineError::DegenerateSplit(format!(
            "cannot build {k} folds over {} rows",
            labels.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut dealt = 0usize;

    for members in group_by_label(labels).into_values() {
        let mut members = members;
        members.shuffle(&mut rng);
        for row in members {
            folds[dealt % k].push(row);
            dealt += 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Group row indices by label, classes in sorted label order.
fn group_by_label(labels: &[String]) -> BTreeMap<&str, Vec<usize>> {
    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(i);
    }
    by_class
}

/// Rounded train count, clamped so both sides stay non-empty.
fn train_count(n: usize, train_fraction: f64) -> usize {
    let rounded = (train_fraction * n as f64).round() as usize;
    rounded.clamp(1, n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn labeled(counts: &[(&str, usize)]) -> Vec<String> {
        let mut labels = Vec::new();
        for &(label, n) in counts {
            for _ in 0..n {
                labels.push(label.to_string());
            }
        }
        labels
    }

    fn count_by_label<'a>(labels: &'a [String], indices: &[usize]) -> HashMap<&'a str, usize> {
        let mut counts = HashMap::new();
        for &i in indices {
            *counts.entry(labels[i].as_str()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_stratified_split_preserves_class_proportions() {
        let labels = labeled(&[("left", 70), ("center", 70), ("right", 60)]);
        let split = train_test_split(&labels, 0.8, 42).unwrap();

        assert!(split.stratified);
        assert_eq!(split.train_len(), 160);
        assert_eq!(split.test_len(), 40);

        let train = count_by_label(&labels, &split.train);
        assert_eq!(train["left"], 56);
        assert_eq!(train["center"], 56);
        assert_eq!(train["right"], 48);

        let test = count_by_label(&labels, &split.test);
        assert_eq!(test["left"], 14);
        assert_eq!(test["center"], 14);
        assert_eq!(test["right"], 12);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let labels = labeled(&[("left", 11), ("right", 9)]);
        let split = train_test_split(&labels, 0.8, 1).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let labels = labeled(&[("left", 30), ("right", 30)]);
        let a = train_test_split(&labels, 0.8, 7).unwrap();
        let b = train_test_split(&labels, 0.8, 7).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);

        let c = train_test_split(&labels, 0.8, 8).unwrap();
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn test_singleton_class_downgrades_to_unstratified() {
        let labels = labeled(&[("left", 9), ("right", 1)]);
        let split = train_test_split(&labels, 0.8, 42).unwrap();

        assert!(!split.stratified);
        assert_eq!(split.train_len() + split.test_len(), 10);
        assert_eq!(split.train_len(), 8);
    }

    #[test]
    fn test_tiny_class_keeps_both_sides_populated() {
        let labels = labeled(&[("left", 2), ("right", 2)]);
        let split = train_test_split(&labels, 0.8, 3).unwrap();

        assert!(split.stratified);
        let train = count_by_label(&labels, &split.train);
        let test = count_by_label(&labels, &split.test);
        assert_eq!(train["left"], 1);
        assert_eq!(train["right"], 1);
        assert_eq!(test["left"], 1);
        assert_eq!(test["right"], 1);
    }

    #[test]
    fn test_too_few_rows_is_an_error() {
        let labels = labeled(&[("left", 1)]);
        assert!(train_test_split(&labels, 0.8, 42).is_err());
    }

    #[test]
    fn test_folds_cover_rows_exactly_once() {
        let labels = labeled(&[("left", 9), ("center", 6), ("right", 6)]);
        let folds = stratified_folds(&labels, 3, 42).unwrap();

        assert_eq!(folds.len(), 3);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..21).collect::<Vec<_>>());

        // Round-robin dealing keeps each class spread across folds.
        for fold in &folds {
            let counts = count_by_label(&labels, fold);
            assert_eq!(counts["left"], 3);
            assert_eq!(counts["center"], 2);
            assert_eq!(counts["right"], 2);
        }
    }

    #[test]
    fn test_many_small_classes_fill_every_fold() {
        // Each class is smaller than the fold count; carrying the dealing
        // position across classes keeps every fold populated.
        let labels = labeled(&[("a", 2), ("b", 2), ("c", 2), ("d", 2), ("e", 2)]);
        let folds = stratified_folds(&labels, 3, 42).unwrap();

        let mut sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert!(sizes.iter().all(|&n| n > 0));
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3, 4]);

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_folds_reject_degenerate_counts() {
        let labels = labeled(&[("left", 4)]);
        assert!(stratified_folds(&labels, 1, 42).is_err());
        assert!(stratified_folds(&labels, 5, 42).is_err());
    }
}
