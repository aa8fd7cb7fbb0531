//! Riverwatch Server
//!
//! Run with: cargo run
//!
//! Environment variables (a `.env` file in the working directory is read first):
//! - RIVERWATCH_HOST: Bind address (default: 0.0.0.0)
//! - RIVERWATCH_PORT: Port number (default: 5000)
//! - DATABASE_URI: Alert store connection string (default: sqlite://riverwatch.db?mode=rwc)
//! - RIVERWATCH_UPLOAD_DIR: Scratch directory for uploads (default: <temp>/uploads)
//! - RIVERWATCH_CORS_ORIGIN: Front-end origin allowed by CORS (default: http://localhost:3000)
//! - RIVERWATCH_SERIES_PATH: Series read from uploaded files
//! - RIVERWATCH_EXTRACTOR: Converter command line (default: dss-extract)
//! - RIVERWATCH_MAX_UPLOAD_MB: Maximum upload size in MB (default: 64)
//! - RUST_LOG: Log level (default: info)

use std::path::PathBuf;

use riverwatch::api::{run_server, ServerConfig};
use riverwatch::series::SeriesPath;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riverwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }

    let defaults = ServerConfig::default();

    let host = std::env::var("RIVERWATCH_HOST").unwrap_or(defaults.host);
    let port: u16 = std::env::var("RIVERWATCH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults.port);
    let database_uri = std::env::var("DATABASE_URI").unwrap_or(defaults.database_uri);
    let upload_dir = std::env::var("RIVERWATCH_UPLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.upload_dir);
    let cors_origin = std::env::var("RIVERWATCH_CORS_ORIGIN").unwrap_or(defaults.cors_origin);
    let series_path = match std::env::var("RIVERWATCH_SERIES_PATH") {
        Ok(raw) => SeriesPath::parse(&raw)?,
        Err(_) => defaults.series_path,
    };
    let extractor_command =
        std::env::var("RIVERWATCH_EXTRACTOR").unwrap_or(defaults.extractor_command);
    let max_upload_bytes = upload_limit_bytes(
        std::env::var("RIVERWATCH_MAX_UPLOAD_MB").ok().as_deref(),
        defaults.max_upload_bytes,
    );

    let config = ServerConfig {
        host,
        port,
        database_uri,
        upload_dir,
        cors_origin,
        series_path,
        extractor_command,
        max_upload_bytes,
    };

    tracing::info!("Riverwatch configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Database: {}", config.database_uri);
    tracing::info!("  Upload dir: {}", config.upload_dir.display());
    tracing::info!("  CORS origin: {}", config.cors_origin);
    tracing::info!("  Series path: {}", config.series_path);
    tracing::info!("  Extractor: {}", config.extractor_command);
    tracing::info!(
        "  Max upload: {} MB",
        config.max_upload_bytes / (1024 * 1024)
    );

    println!(
        r#"
  ____  _                                _       _
 |  _ \(_)_   _____ _ ____      ____ _| |_ ___| |__
 | |_) | \ \ / / _ \ '__\ \ /\ / / _` | __/ __| '_ \
 |  _ <| |\ V /  __/ |   \ V  V / (_| | || (__| | | |
 |_| \_\_| \_/ \___|_|    \_/\_/ \__,_|\__\___|_| |_|

 Discharge Series Extraction & Flood Alerts
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}

/// Convert the configured upload limit in MB to bytes. Unparsable or
/// overflowing values fall back to the default.
fn upload_limit_bytes(mb: Option<&str>, default: usize) -> usize {
    mb.and_then(|m| m.trim().parse::<usize>().ok())
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limit_bytes() {
        let default = 64 * 1024 * 1024;
        assert_eq!(upload_limit_bytes(Some("8"), default), 8 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(None, default), default);
        assert_eq!(upload_limit_bytes(Some("lots"), default), default);
    }

    #[test]
    fn test_upload_limit_bytes_overflow_falls_back() {
        let default = 64 * 1024 * 1024;
        let huge = usize::MAX.to_string();
        assert_eq!(upload_limit_bytes(Some(&huge), default), default);
    }
}
