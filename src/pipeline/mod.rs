//! Preparation pipeline.
//!
//! Runs the stages in a fixed order, each taking the previous stage's
//! table by value and returning a new one:
//!
//! load → attach timestamps → reconstruct calendar → repair gaps →
//! derive features → split
//!
//! Geo variants hold one row per station and hour, so the single-series
//! calendar and gap stages are skipped for them.

pub mod writer;

#[cfg(test)]
pub mod tests;

use self::writer::FeatureWriter;

use crate::calendar::{CalendarRange, attach_timestamps, reconstruct};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::derive;
use crate::loader::DatasetLoader;
use crate::models::{DatasetSplit, Partition, PipelineStats};
use crate::repair::repair_with_report;
use crate::splitter::split;

use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::{debug, info};

/// Everything the pipeline produces
#[derive(Debug)]
pub struct PipelineOutput {
    pub features: DataFrame,
    pub split: DatasetSplit,
    pub stats: PipelineStats,
}

/// Configured preparation pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    loader: DatasetLoader,
    calendar: CalendarRange,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let loader = DatasetLoader::new(config.data_dir.clone());
        Ok(Self {
            config,
            loader,
            calendar: CalendarRange::default(),
        })
    }

    /// Reconstruct over a different hourly range
    pub fn with_calendar(mut self, calendar: CalendarRange) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load, clean and featurize the configured dataset
    pub fn prepare(&self) -> Result<(DataFrame, PipelineStats)> {
        let variant = self.config.geo_variant;
        let mut stats = PipelineStats {
            dataset: variant.dataset_name().to_string(),
            ..Default::default()
        };

        let raw = self.loader.load_variant(variant)?;
        stats.rows_loaded = raw.height();
        let dated = attach_timestamps(raw)?;

        let cleaned = if variant.is_geo() {
            debug!("Geo variant {}: calendar and gap stages skipped", variant);
            stats.rows_after_repair = dated.height();
            dated
        } else {
            let full = reconstruct(dated, &self.calendar)?;
            stats.calendar_rows = full.height();

            let (repaired, report) = repair_with_report(full, self.config.gap_threshold)?;
            stats.gap_runs = report.runs.len();
            stats.gap_runs_dropped = report.dropped_runs(self.config.gap_threshold);
            stats.rows_dropped = report.rows_dropped;
            stats.rows_after_repair = repaired.height();
            repaired
        };

        let features = derive(cleaned, &self.config.features)?;
        stats.feature_columns = features.width();
        Ok((features, stats))
    }

    /// Run every stage and split the result
    pub fn run(&self) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        info!(
            "Preparing dataset '{}' from {}",
            self.config.geo_variant,
            self.loader.data_dir().display()
        );

        let (features, mut stats) = self.prepare()?;

        if let Some(output_path) = &self.config.output_path {
            FeatureWriter::new(output_path).write(&features)?;
            stats.output_path = Some(output_path.clone());
        }

        let split = split(&features, &self.config.split)?;
        stats.train_rows = split.train.len();
        stats.validation_rows = split.validation.as_ref().map_or(0, Partition::len);
        stats.test_rows = split.test.len();
        stats.processing_time_ms = start_time.elapsed().as_millis();

        info!(
            "Pipeline complete in {}ms: {} feature rows",
            stats.processing_time_ms,
            features.height()
        );
        Ok(PipelineOutput {
            features,
            split,
            stats,
        })
    }
}
