//! shoptrend - purchase category prediction for retail customers
//!
//! This crate trains a classifier on a shopping-trends table and answers:
//! - which product category a customer is likely to buy, with class probabilities
//! - how purchases break down by category and season
//!
//! # Modules
//!
//! ## Core ML Modules
//! - [`preprocessing`] - Identifier drop-list and label encoding
//! - [`training`] - Random forest and Gaussian naive Bayes training
//! - [`inference`] - Single-record prediction
//!
//! ## Data
//! - [`schema`] - Column typing, records and values
//! - [`insights`] - Group-by aggregates and similar-customer lookup
//! - [`visualization`] - Feature importance chart
//!
//! ## Session
//! - [`pipeline`] - Dataset, trained model and insights held together
//! - [`config`] - Pipeline configuration
//!
//! ## Utilities
//! - [`utils`] - CSV loading and thread pools

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Data
pub mod schema;
pub mod insights;
pub mod visualization;

// Session
pub mod config;
pub mod pipeline;

// Utilities
pub mod utils;

pub use error::{Result, ShoptrendError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ShoptrendError};

    // Schema
    pub use crate::schema::{ColumnKind, Record, Schema, Value};

    // Preprocessing
    pub use crate::preprocessing::{preprocess, EncoderSet, LabelEncoder, Preprocessor};

    // Training
    pub use crate::training::{
        FeatureImportance, ModelKind, TrainedModel, TrainedPipeline, Trainer, TrainingConfig,
        TrainingOutcome,
    };

    // Inference
    pub use crate::inference::{predict, Prediction};

    // Insights
    pub use crate::insights::{compute_insights, similar_customers, Insights};

    // Session
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::RetailPipeline;

    // Data loading
    pub use crate::utils::DataLoader;
}
