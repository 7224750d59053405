//! Core data structures and types for bike-sharing preparation.
//!
//! Defines dataset variants, gap runs, repair reports, split partitions
//! and pipeline statistics used throughout the library.

use crate::constants::{HOURLY_DATASET, KNOWN_GEO_CODES};
use crate::error::{BikeshareError, Result};
use chrono::NaiveDateTime;
use polars::prelude::{DataFrame, Series};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Dataset variants: the single hourly series or a per-station geo table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GeoVariant {
    #[default]
    None,
    Geo6,
    Geo11,
    Geo21,
}

impl GeoVariant {
    /// Resolve a numeric geo code (0 means no geo variant)
    ///
    /// Codes 4 and 5 appear in older dataset revisions but no backing
    /// tables exist for them, so they are rejected with the rest.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(GeoVariant::None),
            6 => Ok(GeoVariant::Geo6),
            11 => Ok(GeoVariant::Geo11),
            21 => Ok(GeoVariant::Geo21),
            other if KNOWN_GEO_CODES.contains(&other) => Err(BikeshareError::validation(
                format!("geo variant {} has no backing dataset", other),
            )),
            other => Err(BikeshareError::validation(format!(
                "geo variant must be one of [0, 6, 11, 21], got {}",
                other
            ))),
        }
    }

    /// Numeric code of the variant
    pub fn code(&self) -> u8 {
        match self {
            GeoVariant::None => 0,
            GeoVariant::Geo6 => 6,
            GeoVariant::Geo11 => 11,
            GeoVariant::Geo21 => 21,
        }
    }

    /// Logical dataset name used for file lookup
    pub fn dataset_name(&self) -> &'static str {
        match self {
            GeoVariant::None => HOURLY_DATASET,
            GeoVariant::Geo6 => "geo6",
            GeoVariant::Geo11 => "geo11",
            GeoVariant::Geo21 => "geo21",
        }
    }

    pub fn is_geo(&self) -> bool {
        !matches!(self, GeoVariant::None)
    }
}

impl fmt::Display for GeoVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset_name())
    }
}

impl std::str::FromStr for GeoVariant {
    type Err = BikeshareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "hour" | "" => Ok(GeoVariant::None),
            "geo6" => Ok(GeoVariant::Geo6),
            "geo11" => Ok(GeoVariant::Geo11),
            "geo21" => Ok(GeoVariant::Geo21),
            other => {
                let code: u8 = other.parse().map_err(|_| {
                    BikeshareError::validation(format!("unknown geo variant '{}'", s))
                })?;
                GeoVariant::from_code(code)
            }
        }
    }
}

/// Maximal run of consecutive hours with a missing count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapRun {
    pub start: NaiveDateTime,
    pub length: usize,
}

impl GapRun {
    /// Whether the run is too long to repair
    pub fn exceeds(&self, threshold: usize) -> bool {
        self.length > threshold
    }
}

/// Outcome of a gap repair pass
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    pub runs: Vec<GapRun>,
    pub rows_dropped: usize,
    pub rows_filled: usize,
    /// Leading rows still null after forward-fill, per column
    pub leading_nulls: Vec<(String, usize)>,
}

impl RepairReport {
    /// Runs removed from the output
    pub fn dropped_runs(&self, threshold: usize) -> usize {
        self.runs.iter().filter(|run| run.exceeds(threshold)).count()
    }
}

/// Features and target for one side of a split
#[derive(Debug, Clone)]
pub struct Partition {
    pub features: DataFrame,
    pub target: Series,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.features.height()
    }

    pub fn is_empty(&self) -> bool {
        self.features.height() == 0
    }
}

/// Train/test partitions with an optional validation set
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Partition,
    pub test: Partition,
    pub validation: Option<Partition>,
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub dataset: String,
    pub rows_loaded: usize,
    pub calendar_rows: usize,
    pub rows_after_repair: usize,
    pub gap_runs: usize,
    pub gap_runs_dropped: usize,
    pub rows_dropped: usize,
    pub feature_columns: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
    pub output_path: Option<PathBuf>,
    pub processing_time_ms: u128,
}
