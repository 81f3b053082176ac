use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

/// Failures that keep an assessment run from starting.
///
/// Anything that goes wrong once a workbook is loaded is degraded inside the
/// pipeline instead; only these reach the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Path is not a file: {0}")]
    NotAFile(String),
    #[error("Unsupported file format: {extension}. Supported: {supported}")]
    UnsupportedFormat { extension: String, supported: String },
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Workbook contains no sheets")]
    EmptyWorkbook,
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),
    #[error("Download failed: {0}")]
    Download(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::FileNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAFile(_)
            | AppError::UnsupportedFormat { .. }
            | AppError::EmptyWorkbook
            | AppError::WorkbookOpen(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
