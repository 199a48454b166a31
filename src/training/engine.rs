//! Training engine implementation

use crate::error::{Result, ShoptrendError};
use crate::preprocessing::{EncoderSet, LabelEncoder, Preprocessor};
use crate::utils::DataLoader;
use crate::visualization;
use super::config::{ModelKind, TrainingConfig};
use super::naive_bayes::GaussianNaiveBayes;
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// File name of the importance chart inside the artifact directory
pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance.png";

/// Number of features shown on the importance chart
pub const TOP_FEATURES: usize = 10;

/// Fitted classifier variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    RandomForest(RandomForest),
    NaiveBayes(GaussianNaiveBayes),
}

impl Classifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::RandomForest(_) => ModelKind::RandomForest,
            Classifier::NaiveBayes(_) => ModelKind::NaiveBayes,
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict_proba(x),
            Classifier::NaiveBayes(m) => m.predict_proba(x),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict(x),
            Classifier::NaiveBayes(m) => m.predict(x),
        }
    }

    fn classes(&self) -> &[usize] {
        match self {
            Classifier::RandomForest(m) => m.classes(),
            Classifier::NaiveBayes(m) => m.classes(),
        }
    }
}

/// A classifier together with the column layout it was fitted on
///
/// Owns no encoders: those travel separately and must come from the same
/// training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    classifier: Classifier,
    preprocessor: Preprocessor,
    feature_names: Vec<String>,
    target_column: String,
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.classifier.kind()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Feature columns in the order the classifier expects them
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Target class codes, in probability-column order
    pub fn classes(&self) -> &[usize] {
        self.classifier.classes()
    }

    /// Class probabilities for an encoded feature matrix
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.classifier.predict_proba(x)
    }

    /// Predicted target codes for an encoded feature matrix
    pub fn predict_codes(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.classifier.predict(x)
    }

    /// Per-feature importances (random forest only)
    pub fn feature_importances(&self) -> Option<Vec<FeatureImportance>> {
        let Classifier::RandomForest(forest) = &self.classifier else {
            return None;
        };
        let scores = forest.feature_importances()?;

        let mut ranked: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(scores.iter())
            .map(|(feature, &importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Some(ranked)
    }
}

/// A fitted model paired with the encoders its training table went through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedPipeline {
    model: TrainedModel,
    encoders: EncoderSet,
}

impl TrainedPipeline {
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Encoder of the target column
    pub fn target_encoder(&self) -> Result<&LabelEncoder> {
        self.encoders.require(self.model.target_column())
    }

    /// Save the fitted pipeline as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a pipeline written by [`save`](Self::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut pipeline: Self = serde_json::from_str(&json)?;
        pipeline.encoders.reindex();
        Ok(pipeline)
    }
}

/// Importance score of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Figures describing a finished training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model_kind: ModelKind,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_classes: usize,
    /// Accuracy on the training table itself
    pub training_accuracy: f64,
    pub training_time_secs: f64,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: TrainedPipeline,
    /// Ranked importances, random forest only
    pub feature_importances: Option<Vec<FeatureImportance>>,
    /// Bar chart of the top importances, when an artifact directory is set
    pub feature_importance_path: Option<PathBuf>,
    /// Reserved second artifact; no model kind produces it yet
    pub confusion_matrix_path: Option<PathBuf>,
    pub summary: TrainingSummary,
}

/// Fits a classifier on a raw table
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    preprocessor: Preprocessor,
}

impl Trainer {
    /// Create a trainer using the shopping-trends schema
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            preprocessor: Preprocessor::default(),
        }
    }

    /// Use a custom preprocessor (schema / drop-list)
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load a CSV dataset and train on it
    pub fn train_csv(&self, path: impl AsRef<Path>) -> Result<TrainingOutcome> {
        let df = DataLoader::new().load_csv(path)?;
        self.train(&df)
    }

    /// Train on the full table
    pub fn train(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        let start = Instant::now();
        let kind = self.config.model_kind;
        let target = self.config.target_column.as_str();

        info!(model = %kind, rows = df.height(), target, "Training model");

        let (encoded, encoders) = self
            .preprocessor
            .fit_transform(df)
            .map_err(ShoptrendError::into_training)?;

        if encoded.column(target).is_err() {
            return Err(ShoptrendError::TrainingError(format!(
                "target column {:?} not found",
                target
            )));
        }
        if !encoders.contains(target) {
            return Err(ShoptrendError::TrainingError(format!(
                "target column {:?} must be categorical",
                target
            )));
        }

        let feature_names: Vec<String> = encoded
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != target)
            .map(|name| name.to_string())
            .collect();

        if feature_names.is_empty() {
            return Err(ShoptrendError::TrainingError(
                "no feature columns left after preprocessing".to_string(),
            ));
        }

        let x = feature_matrix(&encoded, &feature_names).map_err(ShoptrendError::TrainingError)?;
        let y = target_vector(&encoded, target).map_err(ShoptrendError::TrainingError)?;

        let classifier = self.fit_classifier(&x, &y)?;
        let model = TrainedModel {
            classifier,
            preprocessor: self.preprocessor.clone(),
            feature_names,
            target_column: target.to_string(),
        };

        let predictions = model.predict_codes(&x).map_err(ShoptrendError::into_training)?;
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < 0.5)
            .count();

        let feature_importances = model.feature_importances();
        let feature_importance_path = match (&feature_importances, &self.config.artifact_dir) {
            (Some(ranked), Some(dir)) => Some(self.write_importance_chart(ranked, dir)?),
            _ => None,
        };

        let summary = TrainingSummary {
            model_kind: kind,
            n_samples: x.nrows(),
            n_features: x.ncols(),
            n_classes: model.classes().len(),
            training_accuracy: correct as f64 / y.len() as f64,
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            model = %kind,
            n_samples = summary.n_samples,
            n_features = summary.n_features,
            n_classes = summary.n_classes,
            training_accuracy = summary.training_accuracy,
            elapsed_secs = summary.training_time_secs,
            "Training complete"
        );

        Ok(TrainingOutcome {
            pipeline: TrainedPipeline { model, encoders },
            feature_importances,
            feature_importance_path,
            confusion_matrix_path: None,
            summary,
        })
    }

    fn fit_classifier(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Classifier> {
        let classifier = match self.config.model_kind {
            ModelKind::RandomForest => {
                let params = &self.config.forest;
                let mut forest = RandomForest::new(params.n_estimators)
                    .with_random_state(params.random_state)
                    .with_n_jobs(params.n_jobs);
                if let Some(depth) = params.max_depth {
                    forest = forest.with_max_depth(depth);
                }
                forest.fit(x, y).map_err(ShoptrendError::into_training)?;
                Classifier::RandomForest(forest)
            }
            ModelKind::NaiveBayes => {
                let mut nb = GaussianNaiveBayes::new().with_var_smoothing(self.config.var_smoothing);
                nb.fit(x, y).map_err(ShoptrendError::into_training)?;
                Classifier::NaiveBayes(nb)
            }
        };
        Ok(classifier)
    }

    fn write_importance_chart(&self, ranked: &[FeatureImportance], dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| {
            ShoptrendError::TrainingError(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(FEATURE_IMPORTANCE_FILE);
        let top = &ranked[..ranked.len().min(TOP_FEATURES)];
        visualization::render_feature_importance(top, &path).map_err(ShoptrendError::into_training)?;

        debug!(path = %path.display(), "Wrote feature importance chart");
        Ok(path)
    }
}

/// Gather `columns` of an encoded table into a row-major matrix.
pub(crate) fn feature_matrix(
    df: &DataFrame,
    columns: &[String],
) -> std::result::Result<Array2<f64>, String> {
    let mut x = Array2::zeros((df.height(), columns.len()));

    for (j, name) in columns.iter().enumerate() {
        let values = float_column(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(x)
}

fn target_vector(df: &DataFrame, target: &str) -> std::result::Result<Array1<f64>, String> {
    float_column(df, target).map(Array1::from_vec)
}

fn float_column(df: &DataFrame, name: &str) -> std::result::Result<Vec<f64>, String> {
    let column = df
        .column(name)
        .map_err(|_| format!("missing feature column {:?}", name))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| e.to_string())?;
    let ca = casted.f64().map_err(|e| e.to_string())?;

    ca.into_iter()
        .map(|v| v.ok_or_else(|| format!("null value in column {:?}", name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CATEGORY, PURCHASE_AMOUNT, SEASON};

    fn table() -> DataFrame {
        df!(
            PURCHASE_AMOUNT => &[20.0, 22.0, 25.0, 80.0, 85.0, 90.0],
            SEASON => &["Winter", "Winter", "Fall", "Summer", "Summer", "Spring"],
            CATEGORY => &["Clothing", "Clothing", "Clothing", "Footwear", "Footwear", "Footwear"],
        )
        .unwrap()
    }

    #[test]
    fn test_train_naive_bayes() {
        let outcome = Trainer::new(TrainingConfig::new(ModelKind::NaiveBayes))
            .train(&table())
            .unwrap();

        assert_eq!(outcome.pipeline.model().kind(), ModelKind::NaiveBayes);
        assert_eq!(outcome.pipeline.model().feature_names(), &[PURCHASE_AMOUNT, SEASON]);
        assert!(outcome.feature_importances.is_none());
        assert!(outcome.feature_importance_path.is_none());
        assert!(outcome.confusion_matrix_path.is_none());
        assert_eq!(outcome.summary.n_classes, 2);
    }

    #[test]
    fn test_train_random_forest_ranks_importances() {
        let config = TrainingConfig::new(ModelKind::RandomForest).with_n_estimators(20);
        let outcome = Trainer::new(config).train(&table()).unwrap();

        let ranked = outcome.feature_importances.unwrap();
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].importance >= ranked[1].importance);
        assert!(outcome.feature_importance_path.is_none());
        assert!(outcome.summary.training_accuracy > 0.8);
    }

    #[test]
    fn test_missing_target_fails() {
        let df = table().drop(CATEGORY).unwrap();
        let err = Trainer::new(TrainingConfig::default()).train(&df).unwrap_err();
        assert!(matches!(err, ShoptrendError::TrainingError(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_numeric_target_rejected() {
        let config = TrainingConfig::new(ModelKind::NaiveBayes).with_target(PURCHASE_AMOUNT);
        let err = Trainer::new(config).train(&table()).unwrap_err();
        assert!(matches!(err, ShoptrendError::TrainingError(msg) if msg.contains("categorical")));
    }

    #[test]
    fn test_null_feature_is_training_error() {
        let df = df!(
            PURCHASE_AMOUNT => &[Some(20.0), None, Some(80.0)],
            CATEGORY => &["Clothing", "Clothing", "Footwear"],
        )
        .unwrap();
        let err = Trainer::new(TrainingConfig::new(ModelKind::NaiveBayes))
            .train(&df)
            .unwrap_err();
        assert!(matches!(err, ShoptrendError::TrainingError(msg) if msg.contains("null")));
    }
}
