//! Utility functions and types

pub mod data_loader;
pub mod parallel;

pub use data_loader::{DataLoader, DataSaver};
