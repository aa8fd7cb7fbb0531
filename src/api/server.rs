use axum::{
    extract::DefaultBodyLimit,
    http::{header::InvalidHeaderValue, HeaderValue},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    download_csv, health_check, hello_world, test_db, trigger_placeholder_alert, upload_dss,
    AppState,
};
use crate::alerts::AlertStore;
use crate::series::{CommandExtractor, SeriesPath};
use crate::uploads::UploadStore;

/// Front-end origin admitted by CORS when none is configured
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_uri: String,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
    pub series_path: SeriesPath,
    /// Converter command line; the file and series path are appended
    pub extractor_command: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_uri: "sqlite://riverwatch.db?mode=rwc".to_string(),
            upload_dir: std::env::temp_dir().join("uploads"),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            series_path: SeriesPath::default(),
            extractor_command: "dss-extract".to_string(),
            max_upload_bytes: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// CORS restricted to a single front-end origin. Requests from any other
/// origin get no `Access-Control-Allow-Origin` header at all.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(origin)?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the application router
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(hello_world))
        // Health checks
        .route("/health", get(health_check))
        .route("/test-db", get(test_db))
        // Series upload and export
        .route("/api/upload-dss", post(upload_dss))
        .route("/api/download-csv", get(download_csv))
        // Alerts
        .route(
            "/api/trigger-placeholder-alert",
            post(trigger_placeholder_alert),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize alert store
    let alerts = AlertStore::connect(&config.database_uri).await?;
    alerts.init_schema().await?;
    alerts.seed_default_threshold().await?;

    // Initialize scratch storage
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let uploads = Arc::new(UploadStore::new(&config.upload_dir));

    let extractor = CommandExtractor::from_command_line(&config.extractor_command)
        .ok_or("Extractor command must not be empty")?;
    tracing::info!("Using series extractor '{}'", extractor.program());

    let state = Arc::new(AppState {
        extractor: Arc::new(extractor),
        uploads,
        alerts: alerts.clone(),
        series_path: config.series_path.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = build_router(state, cors_layer(&config.cors_origin)?);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting Riverwatch server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    alerts.pool().close().await;

    tracing::info!("Riverwatch server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, stopping server...");
}
