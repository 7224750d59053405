//! Parquet output for the feature table
//!
//! Persists the featurized table with Snappy compression and full column
//! statistics so downstream training jobs can load it directly.

use crate::error::Result;

use polars::prelude::{
    DataFrame, ParquetCompression, ParquetWriter as PolarsParquetWriter, StatisticsOptions,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer for the prepared feature table
#[derive(Debug)]
pub struct FeatureWriter {
    output_path: PathBuf,
}

impl FeatureWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write the table, creating parent directories as needed
    pub fn write(&self, df: &DataFrame) -> Result<usize> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut df = df.clone();
        let file = std::fs::File::create(&self.output_path)?;
        PolarsParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .with_statistics(StatisticsOptions::full())
            .finish(&mut df)?;

        debug!(
            "Wrote {} rows to {}",
            df.height(),
            self.output_path.display()
        );
        Ok(df.height())
    }
}
