//! End-to-end pipeline tests

use super::{write_geo_csv, write_hourly_csv};
use crate::calendar::CalendarRange;
use crate::config::PipelineConfig;
use crate::models::GeoVariant;
use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use polars::prelude::*;
use tempfile::TempDir;

fn two_day_calendar() -> CalendarRange {
    let day = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
    CalendarRange::new(
        day.and_hms_opt(0, 0, 0).unwrap(),
        day.succ_opt().unwrap().and_hms_opt(23, 0, 0).unwrap(),
    )
    .unwrap()
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

#[test]
fn test_hourly_pipeline_repairs_and_splits() {
    let temp_dir = TempDir::new().unwrap();
    // Short gap at 02-03, outage 10-14 on day 1
    let missing: Vec<(u32, i64)> = [2, 3, 10, 11, 12, 13, 14].iter().map(|h| (1, *h)).collect();
    write_hourly_csv(temp_dir.path(), &missing);

    let config = PipelineConfig::default().with_data_dir(temp_dir.path());
    let output = Pipeline::new(config)
        .unwrap()
        .with_calendar(two_day_calendar())
        .run()
        .unwrap();

    let stats = &output.stats;
    assert_eq!(stats.dataset, "hour");
    assert_eq!(stats.rows_loaded, 41);
    assert_eq!(stats.calendar_rows, 48);
    assert_eq!(stats.gap_runs, 2);
    assert_eq!(stats.gap_runs_dropped, 1);
    assert_eq!(stats.rows_dropped, 5);
    assert_eq!(stats.rows_after_repair, 43);

    assert_eq!(output.features.height(), 43);
    assert_eq!(output.features.column("cnt").unwrap().null_count(), 0);

    // Season 1 keeps 19 rows, season 2 keeps 24
    assert_eq!(stats.test_rows, 7);
    assert_eq!(stats.validation_rows, 7);
    assert_eq!(stats.train_rows, 29);
}

#[test]
fn test_hourly_features_have_indicators() {
    let temp_dir = TempDir::new().unwrap();
    write_hourly_csv(temp_dir.path(), &[]);

    let config = PipelineConfig::default().with_data_dir(temp_dir.path());
    let (features, _) = Pipeline::new(config)
        .unwrap()
        .with_calendar(two_day_calendar())
        .prepare()
        .unwrap();

    let names = column_names(&features);
    for expected in ["datestamp", "season", "spring", "summer", "autumn", "cloudy", "rain"] {
        assert!(names.contains(&expected.to_string()), "missing {}", expected);
    }
    for absent in ["instant", "winter", "sunny", "weathersit"] {
        assert!(!names.contains(&absent.to_string()), "unexpected {}", absent);
    }

    let spring = features.column("spring").unwrap().i32().unwrap();
    assert_eq!(spring.get(0), Some(0));
    assert_eq!(spring.get(24), Some(1));
}

#[test]
fn test_filled_hours_zeroed_and_carried_forward() {
    let temp_dir = TempDir::new().unwrap();
    write_hourly_csv(temp_dir.path(), &[(1, 2), (1, 3)]);

    let config = PipelineConfig::default().with_data_dir(temp_dir.path());
    let (features, stats) = Pipeline::new(config)
        .unwrap()
        .with_calendar(two_day_calendar())
        .prepare()
        .unwrap();

    assert_eq!(stats.rows_after_repair, 48);
    let cnt = features.column("cnt").unwrap().i64().unwrap();
    assert_eq!(cnt.get(2), Some(0));
    assert_eq!(cnt.get(3), Some(0));

    let temp = features.column("temp").unwrap().f64().unwrap();
    assert_eq!(temp.get(2), temp.get(1));
    assert_eq!(temp.get(3), temp.get(1));
}

#[test]
fn test_geo_pipeline_skips_calendar() {
    let temp_dir = TempDir::new().unwrap();
    write_geo_csv(temp_dir.path(), 24);

    let config = PipelineConfig::default()
        .with_data_dir(temp_dir.path())
        .with_geo_variant(GeoVariant::Geo11)
        .without_validation();
    let output = Pipeline::new(config).unwrap().run().unwrap();

    assert_eq!(output.stats.calendar_rows, 0);
    assert_eq!(output.features.height(), 72);

    let names = column_names(&output.features);
    assert!(names.contains(&"z_Arlington".to_string()));
    assert!(names.contains(&"z_Washington".to_string()));
    assert!(!names.contains(&"z_Alexandria".to_string()));
    assert!(!names.contains(&"casual".to_string()));
    assert!(output.split.validation.is_none());
    assert_eq!(output.split.train.len() + output.split.test.len(), 72);
}

#[test]
fn test_feature_table_written_when_requested() {
    let temp_dir = TempDir::new().unwrap();
    write_hourly_csv(temp_dir.path(), &[]);
    let output_path = temp_dir.path().join("out").join("features.parquet");

    let config = PipelineConfig::default()
        .with_data_dir(temp_dir.path())
        .with_output_path(&output_path);
    let output = Pipeline::new(config)
        .unwrap()
        .with_calendar(two_day_calendar())
        .run()
        .unwrap();

    assert!(output_path.exists());
    assert_eq!(output.stats.output_path, Some(output_path));
}

#[test]
fn test_same_seed_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    write_hourly_csv(temp_dir.path(), &[(2, 5)]);

    let run = || {
        let config = PipelineConfig::default().with_data_dir(temp_dir.path());
        Pipeline::new(config)
            .unwrap()
            .with_calendar(two_day_calendar())
            .run()
            .unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.split.test.features.equals_missing(&second.split.test.features));
    assert!(first.split.train.target.equals_missing(&second.split.train.target));
}
