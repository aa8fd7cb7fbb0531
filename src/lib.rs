//! Riverwatch: discharge series extraction and flood alert logging
//!
//! A small HTTP service that accepts an uploaded DSS container file, pulls
//! one named time series out of it, returns the series as JSON and can
//! re-export it as CSV. Alert thresholds and triggered alerts live in a
//! SQLite store.
//!
//! # Features
//!
//! - **Pluggable extraction**: container decoding sits behind [`SeriesExtractor`]
//! - **Per-upload handles**: every upload gets an id that export can name
//! - **CSV export**: built in memory per request
//! - **Alert store**: threshold and alert-log tables with a seed row
//!
//! # Example
//!
//! ```no_run
//! use riverwatch::series::{CommandExtractor, SeriesExtractor, SeriesPath};
//! use std::path::Path;
//!
//! # async fn run() {
//! let extractor = CommandExtractor::new("dss-extract");
//! let points = extractor
//!     .extract(Path::new("Rajaram_Bridge.dss"), &SeriesPath::default())
//!     .await;
//! println!("Extracted {} points", points.len());
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod series;
pub mod uploads;

// Re-export commonly used types
pub use alerts::{AlertStore, StoreError};
pub use series::{DataPoint, SeriesExtractor, SeriesPath};
pub use uploads::{UploadStore, UploadedFile};
