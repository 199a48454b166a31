//! Training artifacts rendered with plotters

mod importance_chart;

pub use importance_chart::{render_feature_importance, render_with_settings, ChartSettings};
