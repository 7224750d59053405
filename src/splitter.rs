//! Stratified train/validation/test splitting.
//!
//! Rows are grouped by the stratification column, each group is shuffled
//! with a seeded ChaCha generator and the leading share of every group is
//! held out. The same seed always yields the same partitions.

use crate::config::SplitConfig;
use crate::error::{BikeshareError, Result};
use crate::loader::drop_present;
use crate::models::{DatasetSplit, Partition};
use polars::prelude::*;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Stratum key per row; nulls form their own stratum
fn strata_keys(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let keys = df
        .column(column)
        .map_err(|_| BikeshareError::missing_column(column))?
        .cast(&DataType::String)?;
    Ok(keys
        .str()?
        .into_iter()
        .map(|key| key.unwrap_or("null").to_string())
        .collect())
}

/// Split `rows` into (kept, held out) preserving the share of every stratum
///
/// Each stratum keeps at least one row on the kept side.
fn stratified_holdout(
    keys: &[String],
    rows: &[IdxSize],
    fraction: f64,
    seed: u64,
) -> (Vec<IdxSize>, Vec<IdxSize>) {
    let mut strata: BTreeMap<&str, Vec<IdxSize>> = BTreeMap::new();
    for &row in rows {
        strata.entry(keys[row as usize].as_str()).or_default().push(row);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut kept = Vec::with_capacity(rows.len());
    let mut held = Vec::new();

    for (key, mut members) in strata {
        members.shuffle(&mut rng);
        let n = members.len();
        let n_held = ((n as f64 * fraction).round() as usize).min(n.saturating_sub(1));
        debug!("Stratum '{}': {} rows, {} held out", key, n, n_held);

        held.extend_from_slice(&members[..n_held]);
        kept.extend_from_slice(&members[n_held..]);
    }

    kept.sort_unstable();
    held.sort_unstable();
    (kept, held)
}

fn partition(df: &DataFrame, rows: Vec<IdxSize>, config: &SplitConfig) -> Result<Partition> {
    let indices = IdxCa::from_vec("row".into(), rows);
    let subset = df.take(&indices)?;

    let target = subset
        .column(&config.target)
        .map_err(|_| BikeshareError::missing_column(config.target.as_str()))?
        .as_materialized_series()
        .clone();

    let mut dropped: Vec<&str> = vec![config.target.as_str(), config.stratify_by.as_str()];
    dropped.extend(config.excluded_columns.iter().map(String::as_str));
    let features = drop_present(subset, &dropped)?;

    Ok(Partition { features, target })
}

/// Partition a featurized table into train/test and optional validation sets
pub fn split(df: &DataFrame, config: &SplitConfig) -> Result<DatasetSplit> {
    for (name, fraction) in [
        ("test fraction", config.test_fraction),
        ("validation fraction", config.validation_fraction),
    ] {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(BikeshareError::validation(format!(
                "{} must be in (0, 1), got {}",
                name, fraction
            )));
        }
    }
    if df.get_column_index(&config.target).is_none() {
        return Err(BikeshareError::missing_column(config.target.as_str()));
    }

    let keys = strata_keys(df, &config.stratify_by)?;
    let all_rows: Vec<IdxSize> = (0..df.height() as IdxSize).collect();

    let (train_rows, test_rows) =
        stratified_holdout(&keys, &all_rows, config.test_fraction, config.seed);

    let (train_rows, validation_rows) = if config.validation {
        let (train, validation) =
            stratified_holdout(&keys, &train_rows, config.validation_fraction, config.seed);
        (train, Some(validation))
    } else {
        (train_rows, None)
    };

    let validation = validation_rows
        .map(|rows| partition(df, rows, config))
        .transpose()?;
    let split = DatasetSplit {
        train: partition(df, train_rows, config)?,
        test: partition(df, test_rows, config)?,
        validation,
    };

    info!(
        "Split {} rows: train {}, validation {}, test {}",
        df.height(),
        split.train.len(),
        split.validation.as_ref().map_or(0, Partition::len),
        split.test.len()
    );
    Ok(split)
}
