//! Random Forest classifier

use crate::error::{Result, ShoptrendError};
use crate::utils::parallel;
use super::decision_tree::{argmax, class_codes, Criterion, DecisionTree};
use ndarray::{Array1, Array2};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Candidate features per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Random state
    pub random_state: Option<u64>,
    /// Worker threads for tree fitting (None = all processors)
    pub n_jobs: Option<usize>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
    /// Class codes seen at fit time, in column order of `predict_proba`
    classes: Vec<usize>,
}

/// Strategy for max features
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
            random_state: None,
            n_jobs: None,
            feature_importances: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Limit the worker pool used while fitting
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest on class codes `y`
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
        if n_samples == 0 || self.n_estimators == 0 {
            return Err(ShoptrendError::TrainingError(
                "random forest needs at least one sample and one tree".to_string(),
            ));
        }

        // Trees see positions into `classes`, not raw codes
        let codes = class_codes(y)?;
        let mut classes = codes.clone();
        classes.sort_unstable();
        classes.dedup();
        let positions: Array1<f64> = codes
            .iter()
            .map(|c| classes.binary_search(c).unwrap_or(0) as f64)
            .collect();

        self.n_features = n_features;
        let n_classes = classes.len();
        let max_features = self.compute_max_features(n_features);
        let base_seed = self.random_state.unwrap_or(42);

        debug!(
            n_estimators = self.n_estimators,
            n_samples,
            n_features,
            n_classes,
            max_features,
            threads = parallel::effective_threads(self.n_jobs),
            "Fitting random forest"
        );

        let forest = &*self;
        let trees: Vec<DecisionTree> = parallel::install(self.n_jobs, || {
            (0..forest.n_estimators)
                .into_par_iter()
                .map(|tree_idx| forest.fit_tree(x, &positions, n_classes, max_features, base_seed, tree_idx))
                .collect::<Result<Vec<_>>>()
        })??;

        self.trees = trees;
        self.classes = classes;
        self.compute_feature_importances();

        Ok(self)
    }

    fn fit_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        n_classes: usize,
        max_features: usize,
        base_seed: u64,
        tree_idx: usize,
    ) -> Result<DecisionTree> {
        let n_samples = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

        let (x_boot, y_boot) = if self.bootstrap {
            let sample_indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();
            (x.select(ndarray::Axis(0), &sample_indices), y_boot)
        } else {
            (x.clone(), y.clone())
        };

        let mut tree = DecisionTree::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(max_features)
            .with_criterion(self.criterion)
            .with_n_classes(n_classes)
            .with_random_state(rng.next_u64());

        if let Some(d) = self.max_depth {
            tree = tree.with_max_depth(d);
        }

        tree.fit(&x_boot, &y_boot)?;
        Ok(tree)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (i, &val) in imp.iter().enumerate().take(self.n_features) {
                    total_importances[i] += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total_importances {
            *imp /= n_trees;
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean of the per-tree leaf distributions
    ///
    /// Runs on the caller's rayon pool; `n_jobs` only sizes the fitting pool.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ShoptrendError::PredictionError(
                "random forest is not fitted".to_string(),
            ));
        }

        let per_tree: Vec<Array2<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for tree_proba in &per_tree {
            proba += tree_proba;
        }
        proba /= per_tree.len() as f64;

        Ok(proba)
    }

    /// Predicted class codes
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())] as f64)
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Class codes in probability-column order
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
