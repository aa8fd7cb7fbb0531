//! Time series extracted from uploaded container files
//!
//! Decoding the container format is delegated to an external collaborator
//! behind [`SeriesExtractor`]; this module owns the point type, the series
//! path identifier and CSV export.

pub mod csv_export;
pub mod extractor;
pub mod path;

pub use csv_export::{write_csv, CSV_HEADER, CSV_TIMESTAMP_FORMAT};
pub use extractor::{CommandExtractor, SeriesExtractor};
pub use path::{SeriesPath, SeriesPathError, DEFAULT_SERIES_PATH};

use chrono::NaiveDateTime;
use serde::Serialize;

/// A single sample of an extracted series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}
