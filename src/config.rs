//! Pipeline configuration
//!
//! Defaults, `SHOPTREND_*` environment overrides and JSON files.

use crate::error::{Result, ShoptrendError};
use crate::schema::CATEGORY;
use crate::training::{ForestParams, ModelKind, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATASET: &str = "SHOPTREND_DATASET";
pub const ENV_ARTIFACT_DIR: &str = "SHOPTREND_ARTIFACT_DIR";
pub const ENV_MODEL: &str = "SHOPTREND_MODEL";
pub const ENV_TARGET: &str = "SHOPTREND_TARGET";
pub const ENV_N_JOBS: &str = "SHOPTREND_N_JOBS";

pub const DEFAULT_DATASET: &str = "data/shopping_trends_updated.csv";
pub const DEFAULT_ARTIFACT_DIR: &str = "images";

/// Everything a [`RetailPipeline`](crate::pipeline::RetailPipeline) session needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV dataset to train on
    pub dataset_path: PathBuf,
    /// Chart output directory (None = no chart)
    pub artifact_dir: Option<PathBuf>,
    pub model_kind: ModelKind,
    pub target_column: String,
    pub forest: ForestParams,
    pub var_smoothing: f64,
    /// Row cap for similar-customer lookups
    pub similar_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            artifact_dir: Some(PathBuf::from(DEFAULT_ARTIFACT_DIR)),
            model_kind: ModelKind::RandomForest,
            target_column: CATEGORY.to_string(),
            forest: ForestParams::default(),
            var_smoothing: 1e-9,
            similar_limit: crate::insights::DEFAULT_SIMILAR_LIMIT,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `SHOPTREND_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATASET) {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_ARTIFACT_DIR) {
            config.artifact_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(kind) = lookup(ENV_MODEL) {
            config.model_kind = kind.parse()?;
        }
        if let Some(target) = lookup(ENV_TARGET) {
            config.target_column = target;
        }
        if let Some(n_jobs) = lookup(ENV_N_JOBS) {
            let n = n_jobs.trim().parse::<usize>().map_err(|_| {
                ShoptrendError::InvalidConfig(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_N_JOBS, n_jobs
                ))
            })?;
            config.forest.n_jobs = Some(n);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(ShoptrendError::InvalidConfig(
                "target column must not be empty".to_string(),
            ));
        }
        if self.forest.n_estimators == 0 {
            return Err(ShoptrendError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.forest.max_depth == Some(0) {
            return Err(ShoptrendError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.forest.n_jobs == Some(0) {
            return Err(ShoptrendError::InvalidConfig(
                "n_jobs must be at least 1".to_string(),
            ));
        }
        if !self.var_smoothing.is_finite() || self.var_smoothing < 0.0 {
            return Err(ShoptrendError::InvalidConfig(format!(
                "var_smoothing must be a non-negative number, got {}",
                self.var_smoothing
            )));
        }
        if self.similar_limit == 0 {
            return Err(ShoptrendError::InvalidConfig(
                "similar_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_artifact_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.artifact_dir = dir;
        self
    }

    pub fn with_model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = kind;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn with_forest(mut self, forest: ForestParams) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_similar_limit(mut self, limit: usize) -> Self {
        self.similar_limit = limit;
        self
    }

    /// Trainer settings derived from this config
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            model_kind: self.model_kind,
            target_column: self.target_column.clone(),
            forest: self.forest.clone(),
            var_smoothing: self.var_smoothing,
            artifact_dir: self.artifact_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.dataset_path, PathBuf::from("data/shopping_trends_updated.csv"));
        assert_eq!(config.artifact_dir, Some(PathBuf::from("images")));
        assert_eq!(config.model_kind, ModelKind::RandomForest);
        assert_eq!(config.similar_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = PipelineConfig::from_vars(vars(&[
            (ENV_DATASET, "/tmp/shop.csv"),
            (ENV_MODEL, "NaiveBayes"),
            (ENV_N_JOBS, "3"),
            (ENV_ARTIFACT_DIR, ""),
        ]))
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/tmp/shop.csv"));
        assert_eq!(config.model_kind, ModelKind::NaiveBayes);
        assert_eq!(config.forest.n_jobs, Some(3));
        assert!(config.artifact_dir.is_none());
    }

    #[test]
    fn test_env_rejects_unknown_model() {
        let err = PipelineConfig::from_vars(vars(&[(ENV_MODEL, "SVM")])).unwrap_err();
        assert!(matches!(err, ShoptrendError::InvalidConfig(_)));
    }

    #[test]
    fn test_env_rejects_bad_n_jobs() {
        let err = PipelineConfig::from_vars(vars(&[(ENV_N_JOBS, "many")])).unwrap_err();
        assert!(matches!(err, ShoptrendError::InvalidConfig(_)));

        let err = PipelineConfig::from_vars(vars(&[(ENV_N_JOBS, "0")])).unwrap_err();
        assert!(matches!(err, ShoptrendError::InvalidConfig(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = PipelineConfig::new()
            .with_model_kind(ModelKind::NaiveBayes)
            .with_similar_limit(3);
        config.save(&path).unwrap();

        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model_kind": "NaiveBayes"}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.model_kind, ModelKind::NaiveBayes);
        assert_eq!(config.forest.n_estimators, 200);
    }

    #[test]
    fn test_training_config() {
        let training = PipelineConfig::new().with_target("Season").training_config();
        assert_eq!(training.target_column, "Season");
        assert_eq!(training.artifact_dir, Some(PathBuf::from("images")));
    }
}
