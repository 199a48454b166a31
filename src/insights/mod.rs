//! Aggregate statistics over the raw purchase table
//!
//! Computed once per loaded dataset and handed out as an immutable
//! snapshot; nothing here refreshes when the table changes.

use crate::error::{Result, ShoptrendError};
use crate::schema::{AGE, CATEGORY, GENDER, LOCATION, PURCHASE_AMOUNT, SEASON};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default row cap for [`similar_customers`]
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;

/// Columns shown for similar customers
pub const SIMILAR_CUSTOMER_COLUMNS: [&str; 4] = [AGE, PURCHASE_AMOUNT, LOCATION, CATEGORY];

/// Warehouse-style aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Mean purchase amount per category
    pub avg_purchase_by_category: BTreeMap<String, f64>,
    /// Row count per season
    pub count_by_season: BTreeMap<String, usize>,
    /// Row count per category
    pub count_by_category: BTreeMap<String, usize>,
}

impl Insights {
    /// Averages rendered as dollar amounts, e.g. `"$59.76"`
    pub fn formatted_averages(&self) -> BTreeMap<String, String> {
        self.avg_purchase_by_category
            .iter()
            .map(|(category, avg)| (category.clone(), format!("${:.2}", avg)))
            .collect()
    }

    /// Total rows counted by category
    pub fn total_rows(&self) -> usize {
        self.count_by_category.values().sum()
    }
}

/// Compute the three aggregates. Null keys are skipped, and categories
/// without a single non-null amount get no average.
pub fn compute_insights(df: &DataFrame) -> Result<Insights> {
    let categories = text_column(df, CATEGORY)?;
    let seasons = text_column(df, SEASON)?;
    let amounts = df
        .column(PURCHASE_AMOUNT)
        .map_err(ShoptrendError::training)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(ShoptrendError::training)?;
    let amounts = amounts.f64().map_err(ShoptrendError::training)?;

    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut count_by_category: BTreeMap<String, usize> = BTreeMap::new();

    for (category, amount) in categories.into_iter().zip(amounts.into_iter()) {
        let Some(category) = category else { continue };
        *count_by_category.entry(category.to_string()).or_default() += 1;

        let entry = sums.entry(category.to_string()).or_insert((0.0, 0));
        if let Some(amount) = amount {
            entry.0 += amount;
            entry.1 += 1;
        }
    }

    let mut avg_purchase_by_category = BTreeMap::new();
    for (category, (sum, n)) in sums {
        if n == 0 {
            warn!(category = %category, "No purchase amounts for category, skipping average");
            continue;
        }
        avg_purchase_by_category.insert(category, sum / n as f64);
    }

    let mut count_by_season: BTreeMap<String, usize> = BTreeMap::new();
    for season in seasons.into_iter().flatten() {
        *count_by_season.entry(season.to_string()).or_default() += 1;
    }

    debug!(
        categories = count_by_category.len(),
        seasons = count_by_season.len(),
        "Computed insights"
    );

    Ok(Insights {
        avg_purchase_by_category,
        count_by_season,
        count_by_category,
    })
}

/// First `limit` rows matching gender, season and category, projected to
/// [`SIMILAR_CUSTOMER_COLUMNS`].
pub fn similar_customers(
    df: &DataFrame,
    gender: &str,
    season: &str,
    category: &str,
    limit: usize,
) -> Result<DataFrame> {
    let mask = text_column(df, GENDER)?.equal(gender)
        & text_column(df, SEASON)?.equal(season)
        & text_column(df, CATEGORY)?.equal(category);

    let matches = df
        .filter(&mask)
        .map_err(ShoptrendError::training)?
        .select(SIMILAR_CUSTOMER_COLUMNS)
        .map_err(ShoptrendError::training)?;

    Ok(matches.head(Some(limit)))
}

fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let series = df
        .column(name)
        .map_err(ShoptrendError::training)?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(ShoptrendError::training)?;
    Ok(series.str().map_err(ShoptrendError::training)?.clone())
}
