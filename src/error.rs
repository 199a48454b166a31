//! Error types for shoptrend

use thiserror::Error;

/// Result type alias for shoptrend operations
pub type Result<T> = std::result::Result<T, ShoptrendError>;

/// Closed set of failures surfaced by the training and prediction paths
#[derive(Error, Debug)]
pub enum ShoptrendError {
    #[error("Model training failed: {0}")]
    TrainingError(String),

    #[error("Prediction failed: {0}")]
    PredictionError(String),

    #[error("Unknown category {value:?} in column {column:?}")]
    UnknownCategoryError { column: String, value: String },

    #[error("No encoder found for column {column:?}")]
    MissingEncoderError { column: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ShoptrendError {
    /// Wrap any displayable failure as a training error.
    pub(crate) fn training(err: impl std::fmt::Display) -> Self {
        ShoptrendError::TrainingError(err.to_string())
    }

    /// Encoder failures keep their structured variant; everything else
    /// collapses into a training error.
    pub(crate) fn into_training(self) -> Self {
        match self {
            ShoptrendError::PredictionError(msg) => ShoptrendError::TrainingError(msg),
            ShoptrendError::InvalidConfig(msg) => ShoptrendError::TrainingError(msg),
            other => other,
        }
    }

    /// Same as [`into_training`](Self::into_training) for the inference side.
    pub(crate) fn into_prediction(self) -> Self {
        match self {
            ShoptrendError::TrainingError(msg) => ShoptrendError::PredictionError(msg),
            ShoptrendError::InvalidConfig(msg) => ShoptrendError::PredictionError(msg),
            other => other,
        }
    }
}

impl From<std::io::Error> for ShoptrendError {
    fn from(err: std::io::Error) -> Self {
        ShoptrendError::InvalidConfig(err.to_string())
    }
}

impl From<serde_json::Error> for ShoptrendError {
    fn from(err: serde_json::Error) -> Self {
        ShoptrendError::InvalidConfig(err.to_string())
    }
}
