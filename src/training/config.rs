//! Training configuration

use crate::error::ShoptrendError;
use crate::schema::CATEGORY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Classifier to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Ensemble of decision trees
    RandomForest,
    /// Gaussian class-conditional model
    NaiveBayes,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::RandomForest, ModelKind::NaiveBayes];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "RandomForest",
            ModelKind::NaiveBayes => "NaiveBayes",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ShoptrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RandomForest" | "random_forest" => Ok(ModelKind::RandomForest),
            "NaiveBayes" | "naive_bayes" => Ok(ModelKind::NaiveBayes),
            other => Err(ShoptrendError::InvalidConfig(format!(
                "unsupported model kind {:?} (expected RandomForest or NaiveBayes)",
                other
            ))),
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Depth cap per tree
    pub max_depth: Option<usize>,
    /// Seed for bootstrap and feature sampling
    pub random_state: u64,
    /// Worker threads for tree fitting (None = all processors)
    pub n_jobs: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: Some(10),
            random_state: 42,
            n_jobs: None,
        }
    }
}

/// Configuration for model training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Model to train
    pub model_kind: ModelKind,

    /// Target column name
    pub target_column: String,

    /// Random forest parameters (ignored by naive Bayes)
    pub forest: ForestParams,

    /// Variance smoothing for naive Bayes
    pub var_smoothing: f64,

    /// Where the feature-importance chart goes (None = no chart)
    pub artifact_dir: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_kind: ModelKind::RandomForest,
            target_column: CATEGORY.to_string(),
            forest: ForestParams::default(),
            var_smoothing: 1e-9,
            artifact_dir: None,
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration
    pub fn new(model_kind: ModelKind) -> Self {
        Self {
            model_kind,
            ..Default::default()
        }
    }

    /// Builder method to set target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    /// Builder method to set number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.forest.n_estimators = n;
        self
    }

    /// Builder method to set max depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.forest.max_depth = Some(depth);
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.forest.random_state = seed;
        self
    }

    /// Builder method to set worker threads
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.forest.n_jobs = Some(n_jobs);
        self
    }

    /// Builder method to enable the importance chart
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }
}
