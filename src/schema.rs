//! Column typing for the shopping-trends dataset
//!
//! Categorical vs numeric is declared up front rather than sniffed from
//! whatever dtype the CSV reader happened to infer. [`Schema::infer`] is the
//! fallback for tables whose layout is not known in advance.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CUSTOMER_ID: &str = "Customer ID";
pub const INVOICE_ID: &str = "Invoice ID";
pub const ITEM_PURCHASED: &str = "Item Purchased";

pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";
pub const PURCHASE_AMOUNT: &str = "Purchase Amount (USD)";
pub const LOCATION: &str = "Location";
pub const SIZE: &str = "Size";
pub const COLOR: &str = "Color";
pub const SEASON: &str = "Season";
pub const REVIEW_RATING: &str = "Review Rating";
pub const SUBSCRIPTION_STATUS: &str = "Subscription Status";
pub const SHIPPING_TYPE: &str = "Shipping Type";
pub const DISCOUNT_APPLIED: &str = "Discount Applied";
pub const PROMO_CODE_USED: &str = "Promo Code Used";
pub const PREVIOUS_PURCHASES: &str = "Previous Purchases";
pub const PAYMENT_METHOD: &str = "Payment Method";
pub const FREQUENCY_OF_PURCHASES: &str = "Frequency of Purchases";
pub const CATEGORY: &str = "Category";

/// Identifier-like columns removed before encoding.
pub const DROPPED_COLUMNS: [&str; 3] = [CUSTOMER_ID, INVOICE_ID, ITEM_PURCHASED];

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Classify a polars dtype: text and booleans are categorical.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String | DataType::Boolean => ColumnKind::Categorical,
            _ => ColumnKind::Numeric,
        }
    }
}

/// Mapping from column name to its semantic type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: BTreeMap<String, ColumnKind>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared layout of `shopping_trends_updated.csv`
    pub fn shopping_trends() -> Self {
        let numeric = [AGE, PURCHASE_AMOUNT, REVIEW_RATING, PREVIOUS_PURCHASES];
        let categorical = [
            GENDER,
            LOCATION,
            SIZE,
            COLOR,
            SEASON,
            SUBSCRIPTION_STATUS,
            SHIPPING_TYPE,
            DISCOUNT_APPLIED,
            PROMO_CODE_USED,
            PAYMENT_METHOD,
            FREQUENCY_OF_PURCHASES,
            CATEGORY,
        ];

        let mut schema = Self::new();
        for name in numeric {
            schema = schema.with_column(name, ColumnKind::Numeric);
        }
        for name in categorical {
            schema = schema.with_column(name, ColumnKind::Categorical);
        }
        schema
    }

    /// Build a schema from the dtypes of an existing table
    pub fn infer(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnKind::from_dtype(c.dtype())))
            .collect();
        Self { columns }
    }

    pub fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.insert(name.into(), kind);
        self
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.get(name).copied()
    }

    /// Kind of a column in `df`, falling back to its dtype when undeclared.
    pub fn resolve(&self, name: &str, dtype: &DataType) -> ColumnKind {
        self.kind(name).unwrap_or_else(|| ColumnKind::from_dtype(dtype))
    }

    /// Categorical columns of `df`, in table order.
    pub fn categorical_columns(&self, df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|c| self.resolve(c.name(), c.dtype()) == ColumnKind::Categorical)
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A single attribute value of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Text form used by label encoders.
    pub fn as_category(&self) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// One row of attributes, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Read row `idx` of `df` back into a record. Nulls are skipped.
    pub fn from_row(df: &DataFrame, idx: usize) -> PolarsResult<Self> {
        let mut record = Self::new();
        for column in df.get_columns() {
            let value = match column.get(idx)? {
                AnyValue::Null => continue,
                AnyValue::Boolean(b) => Value::Bool(b),
                AnyValue::String(s) => Value::Text(s.to_string()),
                AnyValue::StringOwned(s) => Value::Text(s.to_string()),
                other => match other.extract::<f64>() {
                    Some(n) => Value::Number(n),
                    None => Value::Text(other.to_string()),
                },
            };
            record.insert(column.name().to_string(), value);
        }
        Ok(record)
    }

    /// Wrap as a one-row table. Each column's dtype follows `schema`.
    pub fn to_frame(&self, schema: &Schema) -> std::result::Result<DataFrame, String> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.values.len());

        for (name, value) in &self.values {
            let declared = schema.kind(name);
            let series = match (declared, value) {
                (Some(ColumnKind::Numeric), Value::Number(n)) | (None, Value::Number(n)) => {
                    Series::new(name.as_str().into(), &[*n])
                }
                (Some(ColumnKind::Numeric), other) => {
                    return Err(format!(
                        "column {:?} expects a number, got {:?}",
                        name,
                        other.to_string()
                    ));
                }
                (None, Value::Bool(b)) => Series::new(name.as_str().into(), &[*b]),
                (_, other) => Series::new(name.as_str().into(), &[other.as_category()]),
            };
            columns.push(series.into());
        }

        DataFrame::new(columns).map_err(|e| e.to_string())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopping_schema_kinds() {
        let schema = Schema::shopping_trends();
        assert_eq!(schema.kind(AGE), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind(CATEGORY), Some(ColumnKind::Categorical));
        assert_eq!(schema.kind(CUSTOMER_ID), None);
        assert_eq!(schema.len(), 16);
    }

    #[test]
    fn test_infer_from_dtypes() {
        let df = df!(
            "n" => &[1.0, 2.0],
            "s" => &["a", "b"],
            "b" => &[true, false],
        )
        .unwrap();

        let schema = Schema::infer(&df);
        assert_eq!(schema.kind("n"), Some(ColumnKind::Numeric));
        assert_eq!(schema.kind("s"), Some(ColumnKind::Categorical));
        assert_eq!(schema.kind("b"), Some(ColumnKind::Categorical));
        assert_eq!(schema.categorical_columns(&df), vec!["s", "b"]);
    }

    #[test]
    fn test_record_to_frame_follows_schema() {
        let schema = Schema::shopping_trends();
        let record = Record::new()
            .with(AGE, 31.0)
            .with(SIZE, "M")
            .with(DISCOUNT_APPLIED, true);

        let df = record.to_frame(&schema).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(AGE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(SIZE).unwrap().dtype(), &DataType::String);
        // declared categorical, so the bool travels as its text form
        assert_eq!(df.column(DISCOUNT_APPLIED).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_record_rejects_text_in_numeric_column() {
        let schema = Schema::shopping_trends();
        let record = Record::new().with(AGE, "thirty");
        assert!(record.to_frame(&schema).is_err());
    }

    #[test]
    fn test_record_from_row() {
        let df = df!(
            AGE => &[22.0, 40.0],
            SEASON => &["Winter", "Fall"],
        )
        .unwrap();

        let record = Record::from_row(&df, 1).unwrap();
        assert_eq!(record.get(AGE), Some(&Value::Number(40.0)));
        assert_eq!(record.get(SEASON), Some(&Value::Text("Fall".to_string())));
    }
}
