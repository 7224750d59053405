//! Categorical feature expansion.
//!
//! Season, weather situation and station zone are replaced by 0/1
//! indicator columns. One reference category per group is left out so the
//! indicators stay linearly independent. The source season column is kept
//! next to its indicators because the splitter stratifies on it.

use crate::config::FeatureConfig;
use crate::constants::{columns, features};
use crate::error::{BikeshareError, Result};
use crate::loader::drop_present;
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// 0/1 indicator from a boolean condition; null conditions count as 0
fn indicator(condition: Expr, name: &str) -> Expr {
    when(condition)
        .then(lit(1i32))
        .otherwise(lit(0i32))
        .alias(name)
}

fn check_season_codes(df: &DataFrame) -> Result<()> {
    let seasons = df
        .column(columns::SEASON)
        .map_err(|_| BikeshareError::missing_column(columns::SEASON))?
        .cast(&DataType::Int64)?;

    if let Some(bad) = seasons
        .i64()?
        .into_iter()
        .flatten()
        .find(|code| !(1..=4).contains(code))
    {
        return Err(BikeshareError::data_validation(
            columns::SEASON,
            format!("season code {} outside 1..=4", bad),
        ));
    }
    Ok(())
}

fn season_indicators() -> Vec<Expr> {
    features::SEASON_NAMES
        .iter()
        .enumerate()
        .filter(|(_, name)| **name != features::SEASON_REFERENCE)
        .map(|(i, name)| {
            let code = i as i64 + 1;
            indicator(col(columns::SEASON).cast(DataType::Int64).eq(lit(code)), name)
        })
        .collect()
}

/// Weather codes 1 and 2 map to sunny and cloudy; 3 and above to rain
fn weather_indicators(config: &FeatureConfig) -> Vec<Expr> {
    let code = || col(columns::WEATHER).cast(DataType::Int64);
    let [sunny, cloudy, rain] = features::WEATHER_NAMES;

    let mut exprs = Vec::with_capacity(3);
    if !config.drop_weather_reference {
        exprs.push(indicator(code().eq(lit(1i64)), sunny));
    }
    exprs.push(indicator(code().eq(lit(2i64)), cloudy));
    exprs.push(indicator(code().gt_eq(lit(3i64)), rain));
    exprs
}

/// Distinct zones in sorted order
fn zones(df: &DataFrame) -> Result<BTreeSet<String>> {
    let zone_column = df.column(columns::STATION_ZONE)?.cast(&DataType::String)?;
    Ok(zone_column
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

fn zone_indicators(df: &DataFrame, config: &FeatureConfig) -> Result<Vec<Expr>> {
    let zones = zones(df)?;

    let reference = if zones.contains(&config.reference_zone) {
        config.reference_zone.clone()
    } else {
        let fallback = zones.iter().next().cloned().unwrap_or_default();
        warn!(
            "Reference zone '{}' not in data, dropping '{}' instead",
            config.reference_zone, fallback
        );
        fallback
    };
    debug!("Encoding {} zones, reference '{}'", zones.len(), reference);

    Ok(zones
        .iter()
        .filter(|zone| **zone != reference)
        .map(|zone| {
            let name = format!("{}{}", features::ZONE_PREFIX, zone);
            indicator(
                col(columns::STATION_ZONE)
                    .cast(DataType::String)
                    .eq(lit(zone.as_str())),
                &name,
            )
        })
        .collect())
}

/// Expand categorical columns into indicator columns
pub fn derive(df: DataFrame, config: &FeatureConfig) -> Result<DataFrame> {
    check_season_codes(&df)?;

    let mut exprs = season_indicators();
    let mut consumed = Vec::new();

    if df.get_column_index(columns::WEATHER).is_some() {
        exprs.extend(weather_indicators(config));
        consumed.push(columns::WEATHER);
    }

    if df.get_column_index(columns::STATION_ZONE).is_some() {
        exprs.extend(zone_indicators(&df, config)?);
        consumed.push(columns::STATION_ZONE);
    }

    let added = exprs.len();
    let encoded = df.lazy().with_columns(exprs).collect()?;
    let encoded = drop_present(encoded, &consumed)?;

    info!(
        "Derived {} indicator columns, table now {} columns",
        added,
        encoded.width()
    );
    Ok(encoded)
}
