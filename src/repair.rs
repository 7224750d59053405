//! Gap classification and repair for the reconstructed hourly series.
//!
//! Rows whose count is missing are grouped into runs of consecutive hours.
//! A run longer than the threshold is an outage and its rows are removed;
//! shorter runs are kept, their counts set to zero and every other column
//! forward-filled from the last observed hour.
//!
//! Runs are detected by adjacency: a missing hour extends the current run
//! only when it lies exactly one hour after the previous missing hour.

use crate::calendar::{datestamp_millis, from_millis};
use crate::constants::{calendar::HOUR_MS, columns};
use crate::error::{BikeshareError, Result};
use crate::models::{GapRun, RepairReport};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Run of missing rows located by row position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowRun {
    first_row: usize,
    first_ms: i64,
    length: usize,
}

/// Sort by timestamp so that run detection sees hours in order
fn sorted_by_time(df: DataFrame) -> Result<DataFrame> {
    Ok(df.sort([columns::DATESTAMP], SortMultipleOptions::default())?)
}

fn missing_counts(df: &DataFrame) -> Result<Vec<bool>> {
    let counts = df
        .column(columns::COUNT)
        .map_err(|_| BikeshareError::missing_column(columns::COUNT))?;
    Ok(counts.is_null().into_iter().map(|v| v.unwrap_or(false)).collect())
}

/// Group missing rows of a time-sorted frame into runs
fn detect_runs(stamps: &[Option<i64>], missing: &[bool]) -> Result<Vec<RowRun>> {
    let mut runs: Vec<RowRun> = Vec::new();
    let mut previous_ms: Option<i64> = None;

    for (row, (&is_missing, stamp)) in missing.iter().zip(stamps).enumerate() {
        if !is_missing {
            previous_ms = None;
            continue;
        }
        let ms = stamp.ok_or_else(|| {
            BikeshareError::data_validation(columns::DATESTAMP, format!("null at row {}", row))
        })?;

        match (runs.last_mut(), previous_ms) {
            (Some(run), Some(prev)) if ms - prev == HOUR_MS => run.length += 1,
            _ => runs.push(RowRun {
                first_row: row,
                first_ms: ms,
                length: 1,
            }),
        }
        previous_ms = Some(ms);
    }

    Ok(runs)
}

fn to_gap_run(run: &RowRun) -> Result<GapRun> {
    let start = from_millis(run.first_ms).ok_or_else(|| {
        BikeshareError::data_validation(
            columns::DATESTAMP,
            format!("timestamp {} ms at row {} is out of range", run.first_ms, run.first_row),
        )
    })?;
    Ok(GapRun {
        start,
        length: run.length,
    })
}

/// List the runs of missing counts, in time order
pub fn find_gap_runs(df: &DataFrame) -> Result<Vec<GapRun>> {
    let sorted = sorted_by_time(df.clone())?;
    let stamps = datestamp_millis(&sorted)?;
    let missing = missing_counts(&sorted)?;
    detect_runs(&stamps, &missing)?.iter().map(to_gap_run).collect()
}

/// Drop over-threshold gaps and fill the rest
pub fn repair(df: DataFrame, threshold: usize) -> Result<DataFrame> {
    repair_with_report(df, threshold).map(|(repaired, _)| repaired)
}

/// Drop over-threshold gaps and fill the rest, reporting what was done
pub fn repair_with_report(df: DataFrame, threshold: usize) -> Result<(DataFrame, RepairReport)> {
    let df = sorted_by_time(df)?;
    let stamps = datestamp_millis(&df)?;
    let missing = missing_counts(&df)?;
    let runs = detect_runs(&stamps, &missing)?;
    let gap_runs = runs.iter().map(to_gap_run).collect::<Result<Vec<_>>>()?;

    let mut keep = vec![true; df.height()];
    let mut rows_dropped = 0usize;
    let mut rows_filled = 0usize;
    for (run, gap) in runs.iter().zip(&gap_runs) {
        if run.length > threshold {
            keep[run.first_row..run.first_row + run.length].fill(false);
            rows_dropped += run.length;
            debug!("Dropping {} missing hours from {}", run.length, gap.start);
        } else {
            rows_filled += run.length;
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let mut kept = df.filter(&mask)?;

    let names: Vec<String> = kept
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    for name in names.iter().filter(|name| name.as_str() != columns::DATESTAMP) {
        let strategy = if columns::COUNT_COLUMNS.contains(&name.as_str()) {
            FillNullStrategy::Zero
        } else {
            FillNullStrategy::Forward(None)
        };
        let filled = kept
            .column(name)?
            .as_materialized_series()
            .fill_null(strategy)?;
        kept.with_column(filled)?;
    }

    // Forward-fill cannot reach rows ahead of the first observation
    let leading_nulls: Vec<(String, usize)> = kept
        .get_columns()
        .iter()
        .filter(|column| column.null_count() > 0)
        .map(|column| (column.name().to_string(), column.null_count()))
        .collect();
    if !leading_nulls.is_empty() {
        warn!(
            "Leading rows have no earlier value to forward-fill; still null: {:?}",
            leading_nulls
        );
    }

    let report = RepairReport {
        runs: gap_runs,
        rows_dropped,
        rows_filled,
        leading_nulls,
    };
    info!(
        "Gap repair: {} runs, {} dropped ({} rows), {} rows filled, {} rows remain",
        report.runs.len(),
        report.dropped_runs(threshold),
        rows_dropped,
        rows_filled,
        kept.height()
    );

    Ok((kept, report))
}
