//! Bike-sharing Preparation Library
//!
//! Turns the hourly bike-sharing usage dataset into a contiguous, repaired
//! and featurized table ready for regression.
//!
//! This library provides tools for:
//! - Loading datasets from a Parquet snapshot or CSV fallback
//! - Reconstructing the complete hourly calendar
//! - Dropping long outages and filling short gaps
//! - Encoding season, weather and station zone as indicator columns
//! - Seeded, season-stratified train/validation/test splitting

pub mod calendar;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod regression;
pub mod repair;
pub mod splitter;

// Re-export commonly used types
pub use calendar::CalendarRange;
pub use config::PipelineConfig;
pub use error::{BikeshareError, Result};
pub use models::{DatasetSplit, GapRun, GeoVariant, Partition, PipelineStats};
pub use pipeline::{Pipeline, PipelineOutput};
