//! Process-lifetime session: dataset, fitted pipeline and insights

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::inference::Prediction;
use crate::insights::{compute_insights, similar_customers, Insights};
use crate::schema::Record;
use crate::training::{ModelKind, TrainedPipeline, Trainer, TrainingOutcome};
use crate::utils::DataLoader;
use polars::prelude::*;
use tracing::info;

/// Owns everything a prediction front end needs between requests
///
/// Every training call refits from scratch; there is no incremental update.
#[derive(Debug, Clone)]
pub struct RetailPipeline {
    config: PipelineConfig,
    dataset: DataFrame,
    outcome: TrainingOutcome,
    insights: Insights,
}

impl RetailPipeline {
    /// Load the configured dataset, train, and compute insights.
    pub fn bootstrap(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let dataset = DataLoader::new().load_csv(&config.dataset_path)?;
        Self::from_frame(config, dataset)
    }

    /// Same as [`bootstrap`](Self::bootstrap) for an already loaded table.
    pub fn from_frame(config: PipelineConfig, dataset: DataFrame) -> Result<Self> {
        config.validate()?;
        let outcome = Trainer::new(config.training_config()).train(&dataset)?;
        let insights = compute_insights(&dataset)?;

        info!(
            model = %config.model_kind,
            rows = dataset.height(),
            "Pipeline ready"
        );

        Ok(Self {
            config,
            dataset,
            outcome,
            insights,
        })
    }

    /// Refit on the held dataset with another model kind.
    pub fn retrain(&mut self, kind: ModelKind) -> Result<&TrainingOutcome> {
        let config = self.config.clone().with_model_kind(kind);
        self.outcome = Trainer::new(config.training_config()).train(&self.dataset)?;
        self.config = config;
        Ok(&self.outcome)
    }

    /// Re-read the dataset file, then refit and recompute insights.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::bootstrap(self.config.clone())?;
        Ok(())
    }

    pub fn predict(&self, record: &Record) -> Result<Prediction> {
        self.outcome.pipeline.predict(record)
    }

    /// Rows of the held dataset resembling the given customer
    pub fn similar_customers(&self, gender: &str, season: &str, category: &str) -> Result<DataFrame> {
        similar_customers(&self.dataset, gender, season, category, self.config.similar_limit)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dataset(&self) -> &DataFrame {
        &self.dataset
    }

    pub fn outcome(&self) -> &TrainingOutcome {
        &self.outcome
    }

    pub fn trained(&self) -> &TrainedPipeline {
        &self.outcome.pipeline
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    pub fn model_kind(&self) -> ModelKind {
        self.config.model_kind
    }
}
