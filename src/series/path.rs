//! Series path identifiers
//!
//! A series path selects one series inside a container file. It has six
//! slash-delimited parts: `/group/location/parameter/start/interval/version/`.

use std::fmt;
use std::str::FromStr;

/// Discharge series read by both the upload and export endpoints
pub const DEFAULT_SERIES_PATH: &str =
    "/Panchganga/Rajaram Bridge/FLOW/01Jan2021/1Day/Observed Discharge/";

const PART_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPath {
    raw: String,
    parts: [String; PART_COUNT],
}

impl SeriesPath {
    /// Parse a series path. Parts are kept verbatim, casing included.
    pub fn parse(raw: &str) -> Result<Self, SeriesPathError> {
        let inner = raw
            .strip_prefix('/')
            .and_then(|s| s.strip_suffix('/'))
            .ok_or_else(|| SeriesPathError::Unterminated(raw.to_string()))?;

        let split: Vec<&str> = inner.split('/').collect();
        if split.len() != PART_COUNT {
            return Err(SeriesPathError::PartCount {
                path: raw.to_string(),
                found: split.len(),
            });
        }

        let parts = [
            split[0].to_string(),
            split[1].to_string(),
            split[2].to_string(),
            split[3].to_string(),
            split[4].to_string(),
            split[5].to_string(),
        ];

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn location(&self) -> &str {
        &self.parts[1]
    }

    pub fn parameter(&self) -> &str {
        &self.parts[2]
    }
}

impl Default for SeriesPath {
    fn default() -> Self {
        Self {
            raw: DEFAULT_SERIES_PATH.to_string(),
            parts: [
                "Panchganga".to_string(),
                "Rajaram Bridge".to_string(),
                "FLOW".to_string(),
                "01Jan2021".to_string(),
                "1Day".to_string(),
                "Observed Discharge".to_string(),
            ],
        }
    }
}

impl FromStr for SeriesPath {
    type Err = SeriesPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SeriesPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SeriesPathError {
    #[error("Series path must start and end with '/': {0}")]
    Unterminated(String),

    #[error("Series path must have 6 parts, found {found}: {path}")]
    PartCount { path: String, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_series_path() {
        let path = SeriesPath::default();
        assert_eq!(path, SeriesPath::parse(DEFAULT_SERIES_PATH).unwrap());
        assert_eq!(path.as_str(), DEFAULT_SERIES_PATH);
        assert_eq!(path.location(), "Rajaram Bridge");
        assert_eq!(path.parameter(), "FLOW");
    }

    #[test]
    fn test_parse_keeps_casing() {
        let path: SeriesPath = "/a/Site/flow/01JAN2021/1DAY/obs/".parse().unwrap();
        assert_eq!(path.parameter(), "flow");
        assert_eq!(path.to_string(), "/a/Site/flow/01JAN2021/1DAY/obs/");
    }

    #[test]
    fn test_empty_parts_allowed() {
        let path = SeriesPath::parse("//Site/FLOW//1Day//").unwrap();
        assert_eq!(path.location(), "Site");
        assert_eq!(path.parameter(), "FLOW");
        assert_eq!(path.to_string(), "//Site/FLOW//1Day//");
    }

    #[test]
    fn test_rejects_missing_slashes() {
        assert!(matches!(
            SeriesPath::parse("Panchganga/Rajaram Bridge/FLOW/01Jan2021/1Day/Obs/"),
            Err(SeriesPathError::Unterminated(_))
        ));
        assert!(matches!(
            SeriesPath::parse("/A/B/C/D/E/F"),
            Err(SeriesPathError::Unterminated(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_part_count() {
        let err = SeriesPath::parse("/A/B/C/").unwrap_err();
        assert_eq!(
            err,
            SeriesPathError::PartCount {
                path: "/A/B/C/".to_string(),
                found: 3
            }
        );
    }
}
