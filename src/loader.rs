//! Dataset loading with a two-tier file lookup.
//!
//! A logical dataset name resolves to `<data_dir>/<name>.parquet` when that
//! snapshot exists and to `<data_dir>/<name>.csv` otherwise. Identifier
//! columns that carry no information are dropped on load.

use crate::constants::{CACHE_EXTENSION, TEXT_EXTENSION, columns};
use crate::error::{BikeshareError, Result};
use crate::models::GeoVariant;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a dataset was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Binary Parquet snapshot
    Cache(PathBuf),
    /// Delimited text file
    Text(PathBuf),
}

impl DatasetSource {
    pub fn path(&self) -> &Path {
        match self {
            DatasetSource::Cache(path) | DatasetSource::Text(path) => path,
        }
    }
}

/// Loader bound to one data directory
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Find the backing file for a dataset, snapshot first
    pub fn resolve(&self, name: &str) -> Result<DatasetSource> {
        let cache = self.data_dir.join(format!("{}.{}", name, CACHE_EXTENSION));
        if cache.is_file() {
            return Ok(DatasetSource::Cache(cache));
        }

        let text = self.data_dir.join(format!("{}.{}", name, TEXT_EXTENSION));
        if text.is_file() {
            return Ok(DatasetSource::Text(text));
        }

        Err(BikeshareError::NotFound {
            name: name.to_string(),
            dir: self.data_dir.clone(),
        })
    }

    /// Load a dataset by logical name and drop identifier columns
    pub fn load(&self, name: &str) -> Result<DataFrame> {
        let source = self.resolve(name)?;
        debug!("Loading '{}' from {:?}", name, source);

        let df = match &source {
            DatasetSource::Cache(path) => ParquetReader::new(File::open(path)?).finish()?,
            DatasetSource::Text(path) => CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.clone()))?
                .finish()?,
        };

        let df = drop_identifier_columns(df)?;
        info!(
            "Loaded '{}': {} rows, {} columns from {}",
            name,
            df.height(),
            df.width(),
            source.path().display()
        );
        Ok(df)
    }

    /// Load the table backing a dataset variant
    ///
    /// Geo tables lose the casual/registered split since only the total
    /// count is modelled per station.
    pub fn load_variant(&self, variant: GeoVariant) -> Result<DataFrame> {
        let df = self.load(variant.dataset_name())?;
        if variant.is_geo() {
            drop_present(df, &[columns::CASUAL, columns::REGISTERED])
        } else {
            Ok(df)
        }
    }
}

fn is_identifier_column(name: &str) -> bool {
    name == columns::INSTANT || name == columns::UNNAMED_INDEX || name.is_empty()
}

fn drop_identifier_columns(df: DataFrame) -> Result<DataFrame> {
    let identifiers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| is_identifier_column(name))
        .collect();

    let names: Vec<&str> = identifiers.iter().map(String::as_str).collect();
    drop_present(df, &names)
}

/// Drop the listed columns that exist in the frame
pub(crate) fn drop_present(mut df: DataFrame, names: &[&str]) -> Result<DataFrame> {
    for name in names {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
            debug!("Dropped column '{}'", name);
        }
    }
    Ok(df)
}
