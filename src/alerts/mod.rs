//! Flood alert thresholds and the triggered-alert log
//!
//! Thresholds are seeded at startup and only counted today; the log is
//! append-only and written by the placeholder trigger.

pub mod model;
pub mod store;

pub use model::{NewAlertLog, NewAlertThreshold};
pub use store::{AlertStore, StoreError};
