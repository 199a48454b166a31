//! Horizontal bar chart of feature importances

use crate::error::{Result, ShoptrendError};
use crate::training::FeatureImportance;
use plotters::prelude::*;
use std::path::Path;

/// Chart dimensions and caption
#[derive(Debug, Clone)]
pub struct ChartSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub bar_color: (u8, u8, u8),
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: "Top Feature Importances".to_string(),
            width: 1000,
            height: 600,
            bar_color: (31, 119, 180),
        }
    }
}

/// Write `ranked` (highest first) as a PNG bar chart at `path`.
pub fn render_feature_importance(ranked: &[FeatureImportance], path: &Path) -> Result<()> {
    render_with_settings(ranked, path, &ChartSettings::default())
}

/// Same as [`render_feature_importance`] with explicit chart settings.
pub fn render_with_settings(
    ranked: &[FeatureImportance],
    path: &Path,
    settings: &ChartSettings,
) -> Result<()> {
    if ranked.is_empty() {
        return Err(ShoptrendError::TrainingError(
            "no feature importances to plot".to_string(),
        ));
    }

    draw(ranked, path, settings).map_err(|e| {
        ShoptrendError::TrainingError(format!("cannot render {}: {}", path.display(), e))
    })
}

fn draw(
    ranked: &[FeatureImportance],
    path: &Path,
    settings: &ChartSettings,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let n = ranked.len();
    let x_max = ranked
        .iter()
        .map(|f| f.importance)
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON)
        * 1.1;

    // Bars are drawn bottom-up, so the strongest feature takes the top slot.
    let label_at = |slot: usize| -> String {
        n.checked_sub(slot + 1)
            .and_then(|rank| ranked.get(rank))
            .map(|f| f.feature.clone())
            .unwrap_or_default()
    };

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(slot) => label_at(*slot),
            _ => String::new(),
        })
        .x_desc("Importance")
        .draw()?;

    let (r, g, b) = settings.bar_color;
    let color = RGBColor(r, g, b);

    chart.draw_series(ranked.iter().enumerate().map(|(rank, f)| {
        let slot = n - 1 - rank;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (f.importance, SegmentValue::Exact(slot + 1)),
            ],
            color.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
