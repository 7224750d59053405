//! Command-line interface components.

use crate::config::PipelineConfig;
use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_GAP_THRESHOLD, DEFAULT_SEED, DEFAULT_TEST_FRACTION,
    DEFAULT_VALIDATION_FRACTION, features,
};
use crate::models::{GeoVariant, PipelineStats};
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::regression::{MeanRegressor, Regressor, evaluate};
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "bikeshare_prep")]
#[command(about = "Clean and featurize the hourly bike-sharing dataset")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory holding hour/geo6/geo11/geo21 as .parquet or .csv
    #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Dataset variant: none, 6, 11 or 21
    #[arg(short, long, default_value = "none")]
    pub geo: GeoVariant,

    /// Longest run of missing hours that is repaired instead of dropped
    #[arg(short, long, default_value_t = DEFAULT_GAP_THRESHOLD)]
    pub threshold: usize,

    /// Do not carve a validation set out of the training rows
    #[arg(long)]
    pub no_validation: bool,

    /// Seed for the stratified split
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Share of rows held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    pub test_fraction: f64,

    /// Share of training rows held out for validation
    #[arg(long, default_value_t = DEFAULT_VALIDATION_FRACTION)]
    pub validation_fraction: f64,

    /// Zone whose indicator is dropped for geo variants
    #[arg(long, default_value = features::DEFAULT_REFERENCE_ZONE)]
    pub reference_zone: String,

    /// Keep the sunny indicator alongside cloudy and rain
    #[arg(long)]
    pub keep_sunny: bool,

    /// Write the feature table to this Parquet file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Score a mean baseline on the held-out partitions
    #[arg(long)]
    pub baseline: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Build the pipeline configuration from the flags
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default()
            .with_data_dir(self.data_dir.clone())
            .with_geo_variant(self.geo)
            .with_gap_threshold(self.threshold)
            .with_seed(self.seed);

        if self.no_validation {
            config = config.without_validation();
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output.clone());
        }

        config.split.test_fraction = self.test_fraction;
        config.split.validation_fraction = self.validation_fraction;
        config.features.reference_zone = self.reference_zone.clone();
        config.features.drop_weather_reference = !self.keep_sunny;
        config
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides the flag-derived level
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bikeshare_prep={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", level);
}

/// Run the pipeline described by the arguments
pub fn run(args: &Args) -> Result<PipelineOutput> {
    let config = args.to_config();
    let data_dir = config.data_dir.clone();

    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let output = pipeline
        .run()
        .with_context(|| format!("Failed to prepare dataset from {}", data_dir.display()))?;

    print_summary(&output.stats);

    if args.baseline {
        report_baseline(&output)?;
    }
    Ok(output)
}

fn print_summary(stats: &PipelineStats) {
    println!("\n{}", "Preparation Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Dataset:".bright_cyan(),
        stats.dataset.bright_white()
    );
    println!(
        "  {} {}",
        "Rows loaded:".bright_cyan(),
        stats.rows_loaded.to_string().bright_white()
    );
    if stats.calendar_rows > 0 {
        println!(
            "  {} {}",
            "Calendar hours:".bright_cyan(),
            stats.calendar_rows.to_string().bright_white()
        );
        println!(
            "  {} {} ({} dropped, {} rows removed)",
            "Gap runs:".bright_cyan(),
            stats.gap_runs.to_string().bright_white(),
            stats.gap_runs_dropped.to_string().bright_yellow(),
            stats.rows_dropped.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {} rows x {} columns",
        "Feature table:".bright_cyan(),
        stats.rows_after_repair.to_string().bright_white().bold(),
        stats.feature_columns
    );
    println!(
        "  {} train {}, validation {}, test {}",
        "Split:".bright_cyan(),
        stats.train_rows,
        stats.validation_rows,
        stats.test_rows
    );
    if let Some(path) = &stats.output_path {
        println!("  {} {}", "Output:".bright_cyan(), path.display());
    }
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
}

fn report_baseline(output: &PipelineOutput) -> Result<()> {
    let mut model = MeanRegressor::default();
    model
        .fit(&output.split.train)
        .context("Failed to fit mean baseline")?;

    println!("\n{}", "Mean Baseline".bright_green().bold());
    let mut held_out = vec![("test", &output.split.test)];
    if let Some(validation) = &output.split.validation {
        held_out.insert(0, ("validation", validation));
    }
    for (name, partition) in held_out {
        let metrics = evaluate(&model, partition)?;
        println!(
            "  {} rmse {:.2}, mae {:.2} over {} rows",
            format!("{}:", name).bright_cyan(),
            metrics.rmse,
            metrics.mae,
            metrics.n
        );
    }
    Ok(())
}
