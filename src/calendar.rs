//! Hourly calendar reconstruction.
//!
//! Derives a `datestamp` per record from its date and hour-of-day columns,
//! builds the complete hourly calendar for a fixed range and right-joins
//! the records onto it so that every absent hour appears as a null row.

use crate::constants::{calendar, columns};
use crate::error::{BikeshareError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Inclusive hourly range covered by the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Default for CalendarRange {
    /// 2011-01-01 00:00 through 2012-12-31 23:00
    fn default() -> Self {
        let (sy, sm, sd, sh) = calendar::START;
        let (ey, em, ed, eh) = calendar::END;
        Self {
            start: hour_of(sy, sm, sd, sh),
            end: hour_of(ey, em, ed, eh),
        }
    }
}

impl CalendarRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(BikeshareError::validation(format!(
                "calendar start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of hours in the range, both ends included
    pub fn hours(&self) -> usize {
        ((self.end - self.start).num_hours() + 1).max(0) as usize
    }

    /// Every hour from start to end
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        let step = TimeDelta::hours(1);
        let mut hours = Vec::with_capacity(self.hours());
        let mut current = self.start;
        while current <= self.end {
            hours.push(current);
            current += step;
        }
        hours
    }

    /// Single-column frame holding the calendar as `datestamp`
    pub fn to_frame(&self) -> Result<DataFrame> {
        let millis: Vec<i64> = self
            .timestamps()
            .iter()
            .map(|ts| ts.and_utc().timestamp_millis())
            .collect();
        let datestamp = datestamp_series(millis)?;
        Ok(DataFrame::new(vec![datestamp.into()])?)
    }

    fn contains_ms(&self, ms: i64) -> bool {
        ms >= self.start.and_utc().timestamp_millis() && ms <= self.end.and_utc().timestamp_millis()
    }
}

fn hour_of(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

fn datestamp_series(millis: Vec<i64>) -> Result<Series> {
    Ok(Int64Chunked::from_vec(columns::DATESTAMP.into(), millis)
        .into_series()
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

/// Convert an epoch-millisecond value back to a naive timestamp
pub fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// Read `datestamp` as epoch milliseconds
pub(crate) fn datestamp_millis(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(columns::DATESTAMP)
        .map_err(|_| BikeshareError::missing_column(columns::DATESTAMP))?;
    let as_int = column
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(as_int.i64()?.into_iter().collect())
}

/// Read the date column as days since the Unix epoch
fn date_days(df: &DataFrame) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(columns::DATE)
        .map_err(|_| BikeshareError::missing_column(columns::DATE))?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();

    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|value| match value {
                None => Ok(None),
                Some(text) => {
                    let date_part = text.trim().get(..10).unwrap_or(text.trim());
                    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                        .map(|date| Some((date - epoch).num_days()))
                        .map_err(|e| {
                            BikeshareError::data_validation(
                                columns::DATE,
                                format!("cannot parse '{}' as a date: {}", text, e),
                            )
                        })
                }
            })
            .collect(),
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            Ok(days.i32()?.into_iter().map(|d| d.map(i64::from)).collect())
        }
        DataType::Datetime(_, _) => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            Ok(millis
                .i64()?
                .into_iter()
                .map(|ms| ms.map(|ms| ms.div_euclid(calendar::HOUR_MS * 24)))
                .collect())
        }
        other => Err(BikeshareError::data_validation(
            columns::DATE,
            format!("unsupported dtype {:?}", other),
        )),
    }
}

/// Add a `datestamp` column combining the date with the hour of day
pub fn attach_timestamps(df: DataFrame) -> Result<DataFrame> {
    let days = date_days(&df)?;
    let hours_column = df
        .column(columns::HOUR)
        .map_err(|_| BikeshareError::missing_column(columns::HOUR))?
        .cast(&DataType::Int64)?;
    let hours = hours_column.i64()?;

    let mut millis = Vec::with_capacity(df.height());
    for (row, (day, hour)) in days.into_iter().zip(hours.into_iter()).enumerate() {
        let day =
            day.ok_or_else(|| BikeshareError::data_validation(columns::DATE, format!("null at row {}", row)))?;
        let hour = match hour {
            Some(h) if (0..24).contains(&h) => h,
            Some(h) => {
                return Err(BikeshareError::data_validation(
                    columns::HOUR,
                    format!("hour {} out of range at row {}", h, row),
                ));
            }
            None => {
                return Err(BikeshareError::data_validation(
                    columns::HOUR,
                    format!("null at row {}", row),
                ));
            }
        };
        millis.push(day * 24 * calendar::HOUR_MS + hour * calendar::HOUR_MS);
    }

    let mut df = df;
    df.with_column(datestamp_series(millis)?)?;
    debug!("Attached datestamp to {} rows", df.height());
    Ok(df)
}

/// Right-join records onto the complete hourly calendar
///
/// Output holds exactly one row per calendar hour, sorted ascending.
/// Records outside the range are dropped without error.
pub fn reconstruct(records: DataFrame, range: &CalendarRange) -> Result<DataFrame> {
    let stamps = datestamp_millis(&records)?;

    let mut seen = HashSet::with_capacity(stamps.len());
    let mut outside = 0usize;
    for ms in stamps.iter().flatten() {
        // Out-of-range rows are excluded before any duplicate check
        if !range.contains_ms(*ms) {
            outside += 1;
            continue;
        }
        if !seen.insert(*ms) {
            let ts = from_millis(*ms)
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("{} ms", ms));
            return Err(BikeshareError::data_validation(
                columns::DATESTAMP,
                format!("duplicate hour {}", ts),
            ));
        }
    }
    if outside > 0 {
        warn!("{} records fall outside the calendar range and are excluded", outside);
    }

    let input_rows = records.height();
    let calendar = range.to_frame()?;
    let full = calendar
        .lazy()
        .join(
            records.lazy(),
            [col(columns::DATESTAMP)],
            [col(columns::DATESTAMP)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([columns::DATESTAMP], SortMultipleOptions::default())
        .collect()?;

    let matched = input_rows - outside;
    info!(
        "Calendar reconstructed: {} input rows -> {} hourly rows ({} hours absent)",
        input_rows,
        full.height(),
        full.height().saturating_sub(matched)
    );
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        hour_of(2011, 1, day, hour)
    }

    fn hourly_records(hours: &[i64]) -> DataFrame {
        let dates: Vec<&str> = hours.iter().map(|_| "2011-01-01").collect();
        let counts: Vec<i64> = hours.iter().map(|h| 10 + h).collect();
        let df = df! {
            "dteday" => dates,
            "hr" => hours.to_vec(),
            "cnt" => counts,
        }
        .unwrap();
        attach_timestamps(df).unwrap()
    }

    #[test]
    fn test_default_range_covers_two_years() {
        let range = CalendarRange::default();
        assert_eq!(range.start, hour_of(2011, 1, 1, 0));
        assert_eq!(range.end, hour_of(2012, 12, 31, 23));
        // 2011 has 365 days, 2012 is a leap year
        assert_eq!(range.hours(), (365 + 366) * 24);
        assert_eq!(range.timestamps().len(), range.hours());
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            CalendarRange::new(ts(2, 0), ts(1, 0)),
            Err(BikeshareError::Validation { .. })
        ));
    }

    #[test]
    fn test_attach_timestamps_merges_hour() {
        let df = hourly_records(&[0, 5, 23]);
        let stamps = datestamp_millis(&df).unwrap();
        let restored: Vec<NaiveDateTime> =
            stamps.into_iter().map(|ms| from_millis(ms.unwrap()).unwrap()).collect();
        assert_eq!(restored, vec![ts(1, 0), ts(1, 5), ts(1, 23)]);
    }

    #[test]
    fn test_attach_timestamps_rejects_bad_hour() {
        let df = df! {
            "dteday" => ["2011-01-01"],
            "hr" => [24i64],
        }
        .unwrap();
        assert!(matches!(
            attach_timestamps(df),
            Err(BikeshareError::DataValidation { .. })
        ));
    }

    #[test]
    fn test_attach_timestamps_rejects_bad_date() {
        let df = df! {
            "dteday" => ["01/01/2011"],
            "hr" => [0i64],
        }
        .unwrap();
        assert!(attach_timestamps(df).is_err());
    }

    #[test]
    fn test_output_size_depends_only_on_range() {
        let range = CalendarRange::new(ts(1, 0), ts(1, 5)).unwrap();

        for hours in [vec![], vec![3], vec![0, 1, 4, 5], vec![0, 1, 2, 3, 4, 5]] {
            let records = hourly_records(&hours);
            let full = reconstruct(records, &range).unwrap();
            assert_eq!(full.height(), 6);
        }
    }

    #[test]
    fn test_absent_hours_become_null_rows() {
        let range = CalendarRange::new(ts(1, 0), ts(1, 5)).unwrap();
        let full = reconstruct(hourly_records(&[0, 1, 4, 5]), &range).unwrap();

        let counts: Vec<Option<i64>> = full.column("cnt").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(counts, vec![Some(10), Some(11), None, None, Some(14), Some(15)]);

        let hours = full.column("hr").unwrap().i64().unwrap();
        assert_eq!(hours.get(2), None);
        assert_eq!(full.column("dteday").unwrap().null_count(), 2);

        let stamps = datestamp_millis(&full).unwrap();
        assert!(stamps.iter().all(Option::is_some));
        assert!(stamps.windows(2).all(|w| w[1].unwrap() - w[0].unwrap() == calendar::HOUR_MS));
    }

    #[test]
    fn test_rows_outside_range_excluded() {
        let range = CalendarRange::new(ts(1, 1), ts(1, 3)).unwrap();
        let full = reconstruct(hourly_records(&[0, 1, 2, 3, 4]), &range).unwrap();

        assert_eq!(full.height(), 3);
        let counts: Vec<Option<i64>> = full.column("cnt").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(counts, vec![Some(11), Some(12), Some(13)]);
    }

    #[test]
    fn test_duplicated_rows_outside_range_excluded() {
        let range = CalendarRange::new(ts(1, 0), ts(1, 2)).unwrap();
        let df = df! {
            "dteday" => ["2011-01-01", "2011-01-05", "2011-01-05"],
            "hr" => [1i64, 1, 1],
            "cnt" => [11i64, 50, 51],
        }
        .unwrap();

        let full = reconstruct(attach_timestamps(df).unwrap(), &range).unwrap();
        assert_eq!(full.height(), 3);
        let counts: Vec<Option<i64>> = full.column("cnt").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(counts, vec![None, Some(11), None]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let range = CalendarRange::new(ts(1, 0), ts(1, 3)).unwrap();
        let full = reconstruct(hourly_records(&[3, 0, 2, 1]), &range).unwrap();
        let counts: Vec<Option<i64>> = full.column("cnt").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(counts, vec![Some(10), Some(11), Some(12), Some(13)]);
    }

    #[test]
    fn test_duplicate_hours_rejected() {
        let range = CalendarRange::new(ts(1, 0), ts(1, 3)).unwrap();
        match reconstruct(hourly_records(&[1, 1]), &range) {
            Err(BikeshareError::DataValidation { column, .. }) => assert_eq!(column, "datestamp"),
            other => panic!("Expected DataValidation error, got {:?}", other),
        }
    }
}
