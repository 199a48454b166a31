//! Label encoding for categorical columns

use crate::error::{Result, ShoptrendError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fitted bijection between the categories of one column and `0..k`
///
/// Classes are kept in sorted order, so the code of a category depends only
/// on the set of categories seen at fit time, never on row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit an encoder from the distinct values of `values`. Nulls are ignored.
    pub fn fit<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        Self::from_classes(column, distinct.into_iter().collect())
    }

    /// Fit from a polars series (string, boolean or anything castable to string).
    pub fn fit_series(series: &Series) -> Result<Self> {
        let values = category_values(series)?;
        Ok(Self::fit(
            series.name().to_string(),
            values.into_iter().flatten(),
        ))
    }

    fn from_classes(column: impl Into<String>, classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            column: column.into(),
            classes,
            index,
        }
    }

    /// Column this encoder was fitted on
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Categories in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code for a single category
    pub fn encode(&self, value: &str) -> Result<usize> {
        // `index` is rebuilt lazily after deserialization
        let code = if self.index.is_empty() {
            self.classes.iter().position(|c| c == value)
        } else {
            self.index.get(value).copied()
        };

        code.ok_or_else(|| ShoptrendError::UnknownCategoryError {
            column: self.column.clone(),
            value: value.to_string(),
        })
    }

    /// Category for a code
    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| {
                ShoptrendError::PredictionError(format!(
                    "code {} is out of range for column {:?} ({} classes)",
                    code,
                    self.column,
                    self.classes.len()
                ))
            })
    }

    /// Encode a whole series into an `Int64` series of the same name.
    pub fn transform_series(&self, series: &Series) -> Result<Series> {
        let values = category_values(series)?;
        let codes = values
            .into_iter()
            .map(|v| match v {
                Some(s) => self.encode(&s).map(|c| c as i64),
                None => Err(ShoptrendError::UnknownCategoryError {
                    column: self.column.clone(),
                    value: "null".to_string(),
                }),
            })
            .collect::<Result<Vec<i64>>>()?;

        Ok(Series::new(series.name().clone(), codes))
    }

    /// Rebuild the lookup table after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.index = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
    }
}

impl PartialEq for LabelEncoder {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column && self.classes == other.classes
    }
}

/// Text form of every value in a categorical series
fn category_values(series: &Series) -> Result<Vec<Option<String>>> {
    match series.dtype() {
        DataType::String => {
            let ca = series
                .str()
                .map_err(ShoptrendError::training)?;
            Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::Boolean => {
            let ca = series
                .bool()
                .map_err(ShoptrendError::training)?;
            Ok(ca.into_iter().map(|v| v.map(|b| b.to_string())).collect())
        }
        _ => {
            let casted = series
                .cast(&DataType::String)
                .map_err(ShoptrendError::training)?;
            let ca = casted
                .str()
                .map_err(ShoptrendError::training)?;
            Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
        }
    }
}

/// Per-column encoders produced by one fit
///
/// Never mutated once returned from the preprocessor; new fits produce a
/// new set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderSet {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Encoder for `column`, or a missing-encoder error
    pub fn require(&self, column: &str) -> Result<&LabelEncoder> {
        self.get(column)
            .ok_or_else(|| ShoptrendError::MissingEncoderError {
                column: column.to_string(),
            })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    pub(crate) fn insert(&mut self, encoder: LabelEncoder) {
        self.encoders.insert(encoder.column().to_string(), encoder);
    }

    pub(crate) fn reindex(&mut self) {
        for encoder in self.encoders.values_mut() {
            encoder.reindex();
        }
    }
}

impl FromIterator<LabelEncoder> for EncoderSet {
    fn from_iter<I: IntoIterator<Item = LabelEncoder>>(iter: I) -> Self {
        let mut set = Self::new();
        for encoder in iter {
            set.insert(encoder);
        }
        set
    }
}
