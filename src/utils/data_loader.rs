//! Data loading utilities

use crate::error::{Result, ShoptrendError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// CSV loader for the retail dataset
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows sampled for dtype inference (None = whole file)
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(1000),
        }
    }

    /// Set how many rows are scanned to infer column dtypes
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ShoptrendError::TrainingError(format!(
                "dataset not found at {}",
                path.display()
            )));
        }

        let file = File::open(path)
            .map_err(|e| ShoptrendError::TrainingError(format!("{}: {}", path.display(), e)))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ShoptrendError::TrainingError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), columns = df.width(), "Loaded dataset");
        Ok(df)
    }
}

/// Save DataFrame to CSV
pub struct DataSaver;

impl DataSaver {
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(ShoptrendError::training)
    }
}
