//! Series extraction boundary
//!
//! Container decoding lives outside this crate. [`SeriesExtractor`] is the
//! seam the HTTP layer depends on; [`CommandExtractor`] is the production
//! implementation that shells out to an external converter.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tokio::process::Command;

use super::{DataPoint, SeriesPath};

/// Reads one named series out of a container file.
///
/// Implementations must not fail past this boundary: a missing file, an
/// unknown series path, a malformed container and an empty series all come
/// back as an empty vector. Callers treat empty as the single failure signal.
#[async_trait]
pub trait SeriesExtractor: Send + Sync {
    async fn extract(&self, file: &Path, series_path: &SeriesPath) -> Vec<DataPoint>;
}

/// Runs `<program> [args...] <file> <series-path>` and reads a JSON array of
/// `{"timestamp": ..., "value": ...}` objects from its stdout.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add leading arguments passed before the file and series path
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build from a whitespace-separated command line, e.g. `python3 dss2json.py`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let program = tokens.next()?;
        Some(Self::new(program).with_args(tokens))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, file: &Path, series_path: &SeriesPath) -> Result<Vec<DataPoint>, ExtractError> {
        if !file.is_file() {
            return Err(ExtractError::FileNotFound(file.display().to_string()));
        }

        // The child is killed if the request is dropped mid-extraction
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .arg(series_path.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let points = parse_output(&output.stdout)?;
        if points.is_empty() {
            return Err(ExtractError::NoData(series_path.to_string()));
        }
        Ok(points)
    }
}

#[async_trait]
impl SeriesExtractor for CommandExtractor {
    async fn extract(&self, file: &Path, series_path: &SeriesPath) -> Vec<DataPoint> {
        match self.run(file, series_path).await {
            Ok(points) => {
                tracing::info!(
                    series_path = %series_path,
                    location = series_path.location(),
                    parameter = series_path.parameter(),
                    points = points.len(),
                    "Successfully read series"
                );
                points
            }
            Err(e) => {
                tracing::error!(
                    file = %file.display(),
                    series_path = %series_path,
                    "Series extraction failed: {}",
                    e
                );
                Vec::new()
            }
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    timestamp: String,
    value: Option<f64>,
}

/// Decode converter output. Samples with a null value are missing data and
/// are skipped; order is kept as reported.
fn parse_output(stdout: &[u8]) -> Result<Vec<DataPoint>, ExtractError> {
    let raw: Vec<RawPoint> = serde_json::from_slice(stdout)?;

    let mut points = Vec::with_capacity(raw.len());
    for point in raw {
        let Some(value) = point.value else {
            continue;
        };
        let timestamp = parse_timestamp(&point.timestamp)
            .ok_or_else(|| ExtractError::Timestamp(point.timestamp.clone()))?;
        points.push(DataPoint::new(timestamp, value));
    }
    Ok(points)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to run extractor '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extractor exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Invalid extractor output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    #[error("No data found for path: {0}")]
    NoData(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = ts(2021, 1, 1);
        assert_eq!(parse_timestamp("2021-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01T00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01T05:30:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("01Jan2021 2400"), None);
    }

    #[test]
    fn test_parse_output_keeps_order_and_skips_missing() {
        let stdout = br#"[
            {"timestamp": "2021-01-02T00:00:00", "value": 310.5},
            {"timestamp": "2021-01-01T00:00:00", "value": 120.0},
            {"timestamp": "2021-01-03T00:00:00", "value": null}
        ]"#;

        let points = parse_output(stdout).unwrap();
        assert_eq!(
            points,
            vec![
                DataPoint::new(ts(2021, 1, 2), 310.5),
                DataPoint::new(ts(2021, 1, 1), 120.0),
            ]
        );
    }

    #[test]
    fn test_parse_output_rejects_garbage() {
        assert!(matches!(
            parse_output(b"not json"),
            Err(ExtractError::Output(_))
        ));
        assert!(matches!(
            parse_output(br#"[{"timestamp": "yesterday", "value": 1.0}]"#),
            Err(ExtractError::Timestamp(_))
        ));
    }

    #[test]
    fn test_from_command_line() {
        let extractor = CommandExtractor::from_command_line("python3  dss2json.py --strict").unwrap();
        assert_eq!(extractor.program(), "python3");
        assert_eq!(extractor.args, vec!["dss2json.py", "--strict"]);

        assert!(CommandExtractor::from_command_line("   ").is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let extractor = CommandExtractor::new("true");
        let points = extractor
            .extract(Path::new("/nonexistent/upload.dss"), &SeriesPath::default())
            .await;
        assert!(points.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_file_and_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"container").unwrap();

        let script = r#"test "$2" = "/Panchganga/Rajaram Bridge/FLOW/01Jan2021/1Day/Observed Discharge/" || exit 2
test -f "$1" || exit 3
printf '[{"timestamp":"2021-07-01T00:00:00","value":1520.0},{"timestamp":"2021-07-02T00:00:00","value":1610.25}]'"#;
        let extractor = CommandExtractor::new("sh").with_args(["-c", script, "sh"]);

        let points = extractor.extract(file.path(), &SeriesPath::default()).await;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], DataPoint::new(ts(2021, 7, 1), 1520.0));
        assert_eq!(points[1].value, 1610.25);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let extractor = CommandExtractor::new("sh").with_args(["-c", "echo broken >&2; exit 3", "sh"]);

        let points = extractor.extract(file.path(), &SeriesPath::default()).await;
        assert!(points.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_array_is_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let extractor = CommandExtractor::new("sh").with_args(["-c", "printf '[]'", "sh"]);

        assert!(extractor
            .extract(file.path(), &SeriesPath::default())
            .await
            .is_empty());
    }
}
