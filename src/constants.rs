//! Application constants for bike-sharing preparation
//!
//! Column names, dataset file names, the fixed calendar range and the
//! default values shared by the pipeline stages.

// =============================================================================
// Dataset Names and File Extensions
// =============================================================================

/// Base name of the single-series hourly dataset
pub const HOURLY_DATASET: &str = "hour";

/// Binary snapshot extension, preferred over the text source
pub const CACHE_EXTENSION: &str = "parquet";

/// Delimited text extension used when no snapshot exists
pub const TEXT_EXTENSION: &str = "csv";

/// Default directory holding the dataset files
pub const DEFAULT_DATA_DIR: &str = "data";

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    /// Row identifier carried by the raw hourly export
    pub const INSTANT: &str = "instant";

    /// Index column pandas writes when a frame is saved with its index
    pub const UNNAMED_INDEX: &str = "Unnamed: 0";

    pub const DATE: &str = "dteday";
    pub const HOUR: &str = "hr";
    pub const SEASON: &str = "season";
    pub const WEATHER: &str = "weathersit";
    pub const CASUAL: &str = "casual";
    pub const REGISTERED: &str = "registered";
    pub const COUNT: &str = "cnt";
    pub const STATION_ZONE: &str = "station zone";

    /// Derived hourly timestamp
    pub const DATESTAMP: &str = "datestamp";

    /// Count columns zero-filled during repair
    pub const COUNT_COLUMNS: &[&str] = &[CASUAL, REGISTERED, COUNT];
}

// =============================================================================
// Calendar
// =============================================================================

pub mod calendar {
    /// First hour of the dataset: 2011-01-01 00:00
    pub const START: (i32, u32, u32, u32) = (2011, 1, 1, 0);

    /// Last hour of the dataset: 2012-12-31 23:00
    pub const END: (i32, u32, u32, u32) = (2012, 12, 31, 23);

    /// One hour in the millisecond unit used by the `datestamp` column
    pub const HOUR_MS: i64 = 3_600_000;
}

// =============================================================================
// Feature Encoding
// =============================================================================

pub mod features {
    /// Indicator names for season codes 1..=4
    pub const SEASON_NAMES: [&str; 4] = ["winter", "spring", "summer", "autumn"];

    /// Season indicator omitted from the encoded table
    pub const SEASON_REFERENCE: &str = "winter";

    /// Indicator names for weather codes 1..=3
    pub const WEATHER_NAMES: [&str; 3] = ["sunny", "cloudy", "rain"];

    /// Weather indicator omitted in the predictive variant
    pub const WEATHER_REFERENCE: &str = "sunny";

    /// Prefix for station zone indicators
    pub const ZONE_PREFIX: &str = "z_";

    /// Default reference zone dropped from the zone indicators
    pub const DEFAULT_REFERENCE_ZONE: &str = "Alexandria";
}

// =============================================================================
// Defaults
// =============================================================================

/// Longest run of missing hours that is still repaired
pub const DEFAULT_GAP_THRESHOLD: usize = 3;

/// Seed for the stratified shuffle
pub const DEFAULT_SEED: u64 = 420;

/// Share of the table held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.15;

/// Share of the remaining training rows held out for validation
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.20;

/// Geo variant codes seen across dataset revisions
pub const KNOWN_GEO_CODES: &[u8] = &[0, 4, 5, 6, 11, 21];
