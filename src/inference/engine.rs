//! Single-record prediction

use crate::error::{Result, ShoptrendError};
use crate::preprocessing::{EncoderSet, LabelEncoder};
use crate::schema::Record;
use crate::training::{feature_matrix, TrainedModel, TrainedPipeline};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Predicted category plus the full class distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    /// Probability per decoded class label; sums to 1
    pub probabilities: BTreeMap<String, f64>,
}

impl Prediction {
    /// Probability of the predicted category
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(&self.category)
            .copied()
            .unwrap_or_default()
    }

    /// Probabilities as two-decimal percentages, e.g. `"37.50%"`
    pub fn percentages(&self) -> BTreeMap<String, String> {
        self.probabilities
            .iter()
            .map(|(label, p)| (label.clone(), format!("{:.2}%", p * 100.0)))
            .collect()
    }

    /// Human-readable two-line summary
    pub fn report(&self) -> String {
        let entries = self
            .percentages()
            .iter()
            .map(|(label, pct)| format!("{:?}: {}", label, pct))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Predicted Category: {}\nProbabilities: {{{}}}",
            self.category, entries
        )
    }
}

/// Predict the target category of a single raw record.
///
/// The record carries raw attribute values, must not contain the target
/// column, and is encoded with `encoders` from the same training run as
/// `model`. Identifier columns are ignored.
pub fn predict(
    model: &TrainedModel,
    encoders: &EncoderSet,
    record: &Record,
    target_encoder: &LabelEncoder,
) -> Result<Prediction> {
    let target = model.target_column();
    if record.contains(target) {
        return Err(ShoptrendError::PredictionError(format!(
            "record must not contain the target column {:?}",
            target
        )));
    }

    let features = model.feature_names();
    let dropped = model.preprocessor().drop_columns();
    if let Some((extra, _)) = record.iter().find(|(name, _)| {
        !features.iter().any(|f| f == *name) && !dropped.iter().any(|d| d == *name)
    }) {
        return Err(ShoptrendError::PredictionError(format!(
            "record has unexpected column {:?}",
            extra
        )));
    }
    if let Some(missing) = features.iter().find(|name| !record.contains(name)) {
        return Err(ShoptrendError::PredictionError(format!(
            "record is missing feature {:?}",
            missing
        )));
    }

    let frame = record
        .to_frame(model.preprocessor().schema())
        .map_err(ShoptrendError::PredictionError)?;

    let encoded = model
        .preprocessor()
        .transform(&frame, encoders)
        .map_err(ShoptrendError::into_prediction)?;

    let x = feature_matrix(&encoded, features).map_err(ShoptrendError::PredictionError)?;
    let proba = model.predict_proba(&x).map_err(ShoptrendError::into_prediction)?;

    let mut probabilities = BTreeMap::new();
    let mut best: Option<(&str, f64)> = None;
    for (&code, &p) in model.classes().iter().zip(proba.row(0).iter()) {
        let label = target_encoder.decode(code)?;
        if best.map_or(true, |(_, top)| p > top) {
            best = Some((label, p));
        }
        probabilities.insert(label.to_string(), p);
    }

    let (category, confidence) = best.ok_or_else(|| {
        ShoptrendError::PredictionError("model has no classes".to_string())
    })?;

    debug!(model = %model.kind(), category, confidence, "Predicted record");

    Ok(Prediction {
        category: category.to_string(),
        probabilities,
    })
}

impl TrainedPipeline {
    /// Predict with this pipeline's own encoders.
    pub fn predict(&self, record: &Record) -> Result<Prediction> {
        predict(self.model(), self.encoders(), record, self.target_encoder()?)
    }

    /// Predict every record, stopping at the first failure.
    pub fn predict_batch(&self, records: &[Record]) -> Result<Vec<Prediction>> {
        records.iter().map(|r| self.predict(r)).collect()
    }
}
