//! Integration tests for the pipeline module
//!
//! Runs the full preparation flow against small hourly datasets written
//! to temporary directories.

pub mod end_to_end;

use std::fmt::Write;
use std::path::Path;

/// Write a `hour.csv` covering 2011-01-01..=2011-01-02, omitting `missing`
/// (day, hour) pairs. Day 1 is season 1, day 2 season 2.
pub fn write_hourly_csv(dir: &Path, missing: &[(u32, i64)]) {
    let mut csv = String::from(
        "instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt\n",
    );
    let mut instant = 1;
    for day in 1..=2u32 {
        for hour in 0..24i64 {
            if missing.contains(&(day, hour)) {
                continue;
            }
            let casual = hour % 5;
            let registered = hour * 3 + day as i64;
            writeln!(
                csv,
                "{},2011-01-0{},{},0,1,{},0,6,0,{},{:.2},{:.2},0.81,0.0,{},{},{}",
                instant,
                day,
                day,
                hour,
                hour % 3 + 1,
                0.20 + hour as f64 / 100.0,
                0.25,
                casual,
                registered,
                casual + registered
            )
            .unwrap();
            instant += 1;
        }
    }
    std::fs::write(dir.join("hour.csv"), csv).unwrap();
}

/// Write a `geo11.csv` with three zones per hour for the first `hours` hours
pub fn write_geo_csv(dir: &Path, hours: i64) {
    let zones = ["Alexandria", "Arlington", "Washington"];
    let mut csv = String::from("dteday,hr,season,weathersit,temp,station zone,casual,registered,cnt\n");
    for hour in 0..hours {
        for (i, zone) in zones.iter().enumerate() {
            let season = hour % 4 + 1;
            writeln!(
                csv,
                "2011-01-01,{},{},1,0.3,{},1,{},{}",
                hour % 24,
                season,
                zone,
                i + 1,
                i + 2
            )
            .unwrap();
        }
    }
    std::fs::write(dir.join("geo11.csv"), csv).unwrap();
}
