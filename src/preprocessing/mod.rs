//! Data preprocessing module
//!
//! Drops identifier columns and label-encodes categorical columns. The
//! encoders produced by a fit are returned as an [`EncoderSet`] value and
//! must be passed back in for every later transform.

mod encoder;
mod pipeline;

pub use encoder::{EncoderSet, LabelEncoder};
pub use pipeline::{preprocess, Preprocessor};
