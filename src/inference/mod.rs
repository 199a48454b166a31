//! Inference module
//!
//! Turns one raw record into a predicted category and a probability map,
//! using a trained model and the encoders from the same training run.

mod engine;

pub use engine::{predict, Prediction};
