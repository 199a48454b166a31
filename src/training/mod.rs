//! Model training module
//!
//! Fits one of two classifiers on the encoded purchase table:
//! - Random Forest (bagged CART trees, feature importances)
//! - Gaussian Naive Bayes

mod config;
mod engine;
pub mod decision_tree;
pub mod random_forest;
pub mod naive_bayes;

pub use config::{ForestParams, ModelKind, TrainingConfig};
pub use engine::{
    Classifier, FeatureImportance, TrainedModel, TrainedPipeline, Trainer, TrainingOutcome,
    TrainingSummary, FEATURE_IMPORTANCE_FILE, TOP_FEATURES,
};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use naive_bayes::GaussianNaiveBayes;

pub(crate) use engine::feature_matrix;
