//! Table preprocessing: identifier drop-list plus label encoding

use crate::error::{Result, ShoptrendError};
use crate::schema::{ColumnKind, Schema, DROPPED_COLUMNS};
use super::encoder::{EncoderSet, LabelEncoder};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Turns a raw table into an all-numeric table
///
/// Categorical columns become `Int64` codes, numeric columns `Float64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    schema: Schema,
    drop_columns: Vec<String>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(Schema::shopping_trends())
    }
}

impl Preprocessor {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            drop_columns: DROPPED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Replace the identifier drop-list
    pub fn with_drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Identifier columns removed before encoding
    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    /// Fit fresh encoders on every categorical column and encode the table.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(DataFrame, EncoderSet)> {
        self.run(df, None, true)
    }

    /// Encode with previously fitted encoders.
    pub fn transform(&self, df: &DataFrame, encoders: &EncoderSet) -> Result<DataFrame> {
        self.run(df, Some(encoders), false).map(|(encoded, _)| encoded)
    }

    /// Single entry point covering both modes.
    ///
    /// In fit mode any supplied encoders are the starting point and are
    /// replaced column by column; in transform mode they are required.
    pub fn preprocess(
        &self,
        df: &DataFrame,
        encoders: Option<&EncoderSet>,
        fit: bool,
    ) -> Result<(DataFrame, EncoderSet)> {
        self.run(df, encoders, fit)
    }

    fn run(
        &self,
        df: &DataFrame,
        encoders: Option<&EncoderSet>,
        fit: bool,
    ) -> Result<(DataFrame, EncoderSet)> {
        let mut result = self.drop_identifiers(df)?;
        let mut fitted = encoders.cloned().unwrap_or_default();
        let empty = EncoderSet::new();
        let lookup = encoders.unwrap_or(&empty);

        let columns: Vec<(String, ColumnKind)> = result
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), self.schema.resolve(c.name(), c.dtype())))
            .collect();

        for (name, kind) in columns {
            let series = result
                .column(&name)
                .map_err(ShoptrendError::training)?
                .as_materialized_series()
                .clone();

            let encoded = match kind {
                ColumnKind::Categorical if fit => {
                    if series.null_count() > 0 {
                        return Err(ShoptrendError::TrainingError(format!(
                            "null value in categorical column {:?}",
                            name
                        )));
                    }
                    let encoder = LabelEncoder::fit_series(&series)?;
                    debug!(column = %name, classes = encoder.n_classes(), "Fitted label encoder");
                    let encoded = encoder.transform_series(&series)?;
                    fitted.insert(encoder);
                    encoded
                }
                ColumnKind::Categorical => lookup.require(&name)?.transform_series(&series)?,
                ColumnKind::Numeric => series
                    .cast(&DataType::Float64)
                    .map_err(ShoptrendError::training)?,
            };

            result
                .with_column(encoded)
                .map_err(ShoptrendError::training)?;
        }

        Ok((result, fitted))
    }

    /// Remove the identifier columns that are present; absent ones are ignored.
    pub fn drop_identifiers(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for name in &self.drop_columns {
            if result.column(name).is_ok() {
                result = result.drop(name).map_err(ShoptrendError::training)?;
            }
        }
        Ok(result)
    }
}

/// Preprocess `df` with the shopping-trends schema.
pub fn preprocess(
    df: &DataFrame,
    encoders: Option<&EncoderSet>,
    fit: bool,
) -> Result<(DataFrame, EncoderSet)> {
    Preprocessor::default().preprocess(df, encoders, fit)
}
