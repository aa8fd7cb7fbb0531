use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::alerts::AlertStore;
use crate::series::{write_csv, DataPoint, SeriesExtractor, SeriesPath};
use crate::uploads::{UploadError, UploadStore};

/// Multipart field carrying the container file
pub const UPLOAD_FIELD: &str = "file";

/// Download name of the exported series
pub const CSV_FILENAME: &str = "discharge_data.csv";

/// Application state shared across handlers
pub struct AppState {
    pub extractor: Arc<dyn SeriesExtractor>,
    pub uploads: Arc<UploadStore>,
    pub alerts: AlertStore,
    /// Series read by upload and export; fixed for the life of the process
    pub series_path: SeriesPath,
    pub max_upload_bytes: usize,
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn hello_world() -> &'static str {
    "Hello, World! This is the Riverwatch backend."
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct TestDbResponse {
    pub message: String,
    pub count: i64,
}

pub async fn test_db(State(state): State<Arc<AppState>>) -> Result<Json<TestDbResponse>, ApiError> {
    let count = state
        .alerts
        .count_thresholds()
        .await
        .map_err(|e| ApiError::Persistence(format!("Failed to connect to the database: {}", e)))?;

    Ok(Json(TestDbResponse {
        message: format!(
            "Successfully connected to the database. Found {} alert thresholds.",
            count
        ),
        count,
    }))
}

// ============================================================================
// Upload & Extraction
// ============================================================================

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub upload_id: Uuid,
    pub data: Vec<DataPoint>,
}

pub async fn upload_dss(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::Validation("No file part in the request".to_string()))?;

    let mut upload: Option<(String, axum::body::Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::Validation("No file part in the request".to_string()))?;
    if filename.is_empty() {
        return Err(ApiError::Validation("No selected file".to_string()));
    }

    let file = state.uploads.save(&filename, &bytes).await.map_err(|e| match e {
        UploadError::InvalidFilename(_) => ApiError::Validation(e.to_string()),
        UploadError::Io(_) => {
            ApiError::Internal(format!("An internal server error occurred: {}", e))
        }
    })?;

    tracing::info!(
        upload_id = %file.id,
        filename = %file.filename,
        bytes = file.size_bytes,
        "Received container file"
    );

    let data = state.extractor.extract(&file.path, &state.series_path).await;
    if data.is_empty() {
        return Err(ApiError::Extraction(
            "Failed to extract data from the DSS file. Check the file path and internal data path."
                .to_string(),
        ));
    }

    Ok(Json(UploadResponse {
        message: "File uploaded and data extracted successfully!",
        upload_id: file.id,
        data,
    }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(e.body_text())
    } else {
        ApiError::Validation(e.body_text())
    }
}

// ============================================================================
// CSV Export
// ============================================================================

#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub upload_id: Option<String>,
}

pub async fn download_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let upload_id = query
        .upload_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| ApiError::Validation(format!("Invalid upload_id: {}", e)))?;

    let file = state
        .uploads
        .resolve(upload_id.as_ref())
        .ok_or_else(|| ApiError::NotFound("No DSS file has been processed yet.".to_string()))?;

    let data = state.extractor.extract(&file.path, &state.series_path).await;
    if data.is_empty() {
        return Err(ApiError::Extraction(
            "Failed to re-process data for download.".to_string(),
        ));
    }

    let csv = write_csv(&data)
        .map_err(|e| ApiError::Internal(format!("An internal server error occurred: {}", e)))?;

    tracing::debug!(upload_id = %file.id, rows = data.len(), "Exported series as CSV");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn trigger_placeholder_alert(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .alerts
        .trigger_placeholder_alert()
        .await
        .map_err(|e| ApiError::Persistence(format!("Failed to trigger placeholder alert: {}", e)))?;

    Ok(Json(MessageResponse {
        message: "Placeholder alert successfully logged to the database!",
    }))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    TooLarge(String),
    Extraction(String),
    Persistence(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::TooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Extraction(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Persistence(msg) => {
                tracing::error!("{}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!("{}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
