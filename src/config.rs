//! Configuration management and validation.
//!
//! Provides configuration structures for the preparation pipeline:
//! dataset selection, gap repair, feature encoding and split parameters.
//! Everything is resolved once and passed by value to the stages.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_GAP_THRESHOLD, DEFAULT_SEED, DEFAULT_TEST_FRACTION,
    DEFAULT_VALIDATION_FRACTION, columns, features,
};
use crate::error::{BikeshareError, Result};
use crate::models::GeoVariant;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Feature encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Drop the `sunny` indicator (predictive variant)
    pub drop_weather_reference: bool,

    /// Zone whose indicator is dropped from geo tables
    pub reference_zone: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            drop_weather_reference: true,
            reference_zone: features::DEFAULT_REFERENCE_ZONE.to_string(),
        }
    }
}

/// Train/validation/test split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Share of rows held out for testing
    pub test_fraction: f64,

    /// Share of the training rows held out for validation
    pub validation_fraction: f64,

    /// Produce a validation partition
    pub validation: bool,

    /// Seed for the stratified shuffle
    pub seed: u64,

    /// Categorical column whose distribution is preserved
    pub stratify_by: String,

    /// Target column
    pub target: String,

    /// Columns never passed to the model as features
    pub excluded_columns: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
            validation: true,
            seed: DEFAULT_SEED,
            stratify_by: columns::SEASON.to_string(),
            target: columns::COUNT.to_string(),
            excluded_columns: vec![
                columns::CASUAL.to_string(),
                columns::REGISTERED.to_string(),
            ],
        }
    }
}

/// Global configuration for the preparation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding `hour`, `geo6`, `geo11`, `geo21` files
    pub data_dir: PathBuf,

    /// Dataset variant to prepare
    pub geo_variant: GeoVariant,

    /// Longest run of missing hours that is repaired instead of dropped
    pub gap_threshold: usize,

    pub features: FeatureConfig,

    pub split: SplitConfig,

    /// Optional Parquet destination for the feature table
    pub output_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            geo_variant: GeoVariant::None,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            output_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create configuration with a custom data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Select the dataset variant
    pub fn with_geo_variant(mut self, geo_variant: GeoVariant) -> Self {
        self.geo_variant = geo_variant;
        self
    }

    /// Set the gap repair threshold
    pub fn with_gap_threshold(mut self, gap_threshold: usize) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    /// Set the split seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = seed;
        self
    }

    /// Skip the validation partition
    pub fn without_validation(mut self) -> Self {
        self.split.validation = false;
        self
    }

    /// Write the feature table to a Parquet file
    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    /// Reject out-of-range values before any computation
    pub fn validate(&self) -> Result<()> {
        if self.gap_threshold == 0 {
            return Err(BikeshareError::validation(
                "gap threshold must be at least 1 hour",
            ));
        }

        for (name, fraction) in [
            ("test fraction", self.split.test_fraction),
            ("validation fraction", self.split.validation_fraction),
        ] {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(BikeshareError::validation(format!(
                    "{} must be in (0, 1), got {}",
                    name, fraction
                )));
            }
        }

        if self.split.stratify_by.is_empty() || self.split.target.is_empty() {
            return Err(BikeshareError::validation(
                "stratification and target columns must be named",
            ));
        }

        if self.geo_variant.is_geo() && self.features.reference_zone.trim().is_empty() {
            return Err(BikeshareError::validation(
                "reference zone must be set for geo variants",
            ));
        }

        debug!("Configuration validated: {:?}", self);
        Ok(())
    }
}
