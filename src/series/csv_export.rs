//! CSV serialization of extracted series

use super::DataPoint;

pub const CSV_HEADER: [&str; 2] = ["timestamp", "value"];

/// Timestamps are written without the `T` separator
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialize points to an in-memory CSV document, header first
pub fn write_csv(points: &[DataPoint]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for point in points {
        let timestamp = point.timestamp.format(CSV_TIMESTAMP_FORMAT).to_string();
        // Debug keeps the decimal point on whole numbers ("1520.0")
        let value = format!("{:?}", point.value);
        wtr.write_record([timestamp.as_str(), value.as_str()])?;
    }

    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
