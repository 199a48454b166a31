//! Decision tree classifier
//!
//! Trees are grown on integer class codes `0..n_classes` stored as `f64`.
//! Leaves keep the full class distribution of the samples that reached
//! them so a forest can average probabilities rather than votes.

use crate::error::{Result, ShoptrendError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the class distribution of its samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Entropy
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

/// Best split found for one feature: (feature, threshold, gain)
type SplitCandidate = (usize, f64, f64);

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth (root is depth 0)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Candidate features drawn at each split (None = all)
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for feature sampling
    pub random_state: Option<u64>,
    /// Number of classes; 0 means "infer from labels"
    n_classes: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_classes: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of candidate features per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fix the width of leaf distributions. Needed when a bootstrap sample
    /// may miss some classes.
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// Fit the tree on class codes `y`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ShoptrendError::TrainingError(format!(
                "expected {} labels, got {}",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(ShoptrendError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        let labels = class_codes(y)?;
        let observed = labels.iter().max().map_or(0, |&m| m + 1);
        if self.n_classes < observed {
            self.n_classes = observed;
        }
        self.n_features = n_features;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();

        let root = self.build_tree(x, &labels, &indices, 0, &mut importances, &mut rng);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_counts(&self, labels: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[labels[i]] += 1;
        }
        counts
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        labels: &[usize],
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(labels, indices);
        let impurity = self.criterion.impurity(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || counts.iter().filter(|&&c| c > 0).count() <= 1;

        if should_stop {
            return leaf(&counts, n_samples);
        }

        let Some((feature_idx, threshold, gain)) =
            self.find_best_split(x, labels, indices, &counts, impurity, rng)
        else {
            return leaf(&counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return leaf(&counts, n_samples);
        }

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, labels, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, labels, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        labels: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_candidates = self.max_features.unwrap_or(n_features).min(n_features);

        // Drawn sequentially so the choice does not depend on thread scheduling
        let features: Vec<usize> = if n_candidates < n_features {
            sample(rng, n_features, n_candidates).into_vec()
        } else {
            (0..n_features).collect()
        };

        // Each candidate feature scans its sorted values independently
        let results: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                self.best_split_for_feature(
                    x.column(feature_idx),
                    feature_idx,
                    labels,
                    indices,
                    parent_counts,
                    parent_impurity,
                )
            })
            .collect();

        let mut best: Option<SplitCandidate> = None;
        for candidate in results.into_iter().flatten() {
            if best.map_or(true, |b| candidate.2 > b.2) {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_split_for_feature(
        &self,
        column: ArrayView1<'_, f64>,
        feature_idx: usize,
        labels: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (column[i], labels[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let mut left_counts = vec![0usize; self.n_classes];
        let mut right_counts = parent_counts.to_vec();
        let mut best_gain = 0.0f64;
        let mut best_threshold = None;

        for i in 0..n - 1 {
            let (value, class) = sorted[i];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next = sorted[i + 1].0;
            if next <= value {
                continue;
            }

            let left_n = i + 1;
            let right_n = n - left_n;
            if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                continue;
            }

            let weighted = (left_n as f64 * self.criterion.impurity(&left_counts, left_n)
                + right_n as f64 * self.criterion.impurity(&right_counts, right_n))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > best_gain {
                best_gain = gain;
                best_threshold = Some((value + next) / 2.0);
            }
        }

        best_threshold.map(|t| (feature_idx, t, best_gain))
    }

    /// Class probabilities, one row per sample and one column per class code
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.root.as_ref().ok_or_else(not_fitted)?;
        self.check_width(x)?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let distribution = descend(root, row);
            for (j, &p) in distribution.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }

    /// Most probable class code per sample
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| argmax(row.iter().copied()) as f64)
            .collect())
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(ShoptrendError::PredictionError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth in edges; a single leaf has depth 0
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

fn leaf(counts: &[usize], n_samples: usize) -> TreeNode {
    let total = n_samples.max(1) as f64;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        n_samples,
    }
}

fn descend<'a>(mut node: &'a TreeNode, sample: ArrayView1<'_, f64>) -> &'a [f64] {
    loop {
        match node {
            TreeNode::Leaf { distribution, .. } => return distribution,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                node = if sample[*feature_idx] <= *threshold { left } else { right };
            }
        }
    }
}

fn not_fitted() -> ShoptrendError {
    ShoptrendError::PredictionError("model is not fitted".to_string())
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = i;
        }
    }
    best_idx
}

/// Validate labels as non-negative integer class codes.
pub(crate) fn class_codes(y: &Array1<f64>) -> Result<Vec<usize>> {
    y.iter()
        .map(|&v| {
            if v >= 0.0 && v.fract() == 0.0 && v.is_finite() {
                Ok(v as usize)
            } else {
                Err(ShoptrendError::TrainingError(format!(
                    "target value {} is not a class code",
                    v
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0], [5.0, 5.0], [6.0, 6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
        assert!(tree.get_n_leaves() <= 4);
    }

    #[test]
    fn test_leaf_distribution_sums_to_one() {
        let x = array![[1.0], [1.0], [1.0], [2.0]];
        let y = array![0.0, 1.0, 1.0, 2.0];

        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert_eq!(proba.ncols(), 3);
        assert!((proba.row(0).sum() - 1.0).abs() < 1e-12);
        assert!((proba[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_rejects_non_integer_labels() {
        let x = array![[1.0], [2.0]];
        let y = array![0.5, 1.0];
        assert!(DecisionTree::new().fit(&x, &y).is_err());
    }

    #[test]
    fn test_width_mismatch_is_prediction_error() {
        let x = array![[1.0, 2.0], [2.0, 1.0]];
        let y = array![0.0, 1.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let err = tree.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, ShoptrendError::PredictionError(_)));
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax([0.2, 0.4, 0.4].into_iter()), 1);
    }
}
