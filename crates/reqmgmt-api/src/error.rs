//! # API Errors and Response Envelope
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "message": "success", "data": { ... } }
//! { "success": false, "message": "requirement 'REQ-9' not found", "data": null }
//! ```
//!
//! Handlers return `Result<ApiResponse<T>, AppError>`. [`AppError`] renders
//! the failure envelope with an HTTP status matching the error class.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqmgmt_core::StoreError;
use reqmgmt_export::ExportError;
use reqmgmt_import::ImportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message of every successful response.
pub const SUCCESS_MESSAGE: &str = "success";

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failure envelope, `data` is always null.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Upload is a workbook the importer cannot use (422).
    #[error("{0}")]
    Validation(String),

    /// Request body or upload could not be read (400).
    #[error("{0}")]
    BadRequest(String),

    /// Storage or file system failure (500).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Prefix the message with the operation that failed.
    pub fn context(self, operation: &str) -> Self {
        match self {
            Self::NotFound(m) => Self::NotFound(format!("{operation}: {m}")),
            Self::Validation(m) => Self::Validation(format!("{operation}: {m}")),
            Self::BadRequest(m) => Self::BadRequest(format!("{operation}: {m}")),
            Self::Internal(m) => Self::Internal(format!("{operation}: {m}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::DuplicateKey(_) | StoreError::Backend(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Workbook(_)
            | ImportError::NoWorksheet
            | ImportError::MissingHeaderRow
            | ImportError::MissingColumn(_) => Self::Validation(err.to_string()),
            ImportError::Task(_) | ImportError::Store { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NotFound(_) => Self::NotFound(err.to_string()),
            ExportError::Io { .. } | ExportError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}
