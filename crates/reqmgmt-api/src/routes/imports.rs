//! # Spreadsheet Import API
//!
//! Multipart uploads with the workbook in field `file`. The response data is
//! the number of records inserted plus updated.
//!
//! ## Endpoints
//!
//! - `POST /req/import/list`: requirement headers
//! - `POST /req/import/detail`: requirement details

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::Router;

use crate::error::{ApiResponse, AppError};
use crate::extractors::read_upload;
use crate::state::AppState;

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/req/import/list", post(import_headers))
        .route("/req/import/detail", post(import_details))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /req/import/list: Import requirement headers from a workbook.
#[utoipa::path(
    post,
    path = "/req/import/list",
    request_body(content_type = "multipart/form-data", description = "Workbook in field `file`"),
    responses(
        (status = 200, description = "Records processed", body = ApiResponse<usize>),
        (status = 400, description = "Upload missing or unreadable", body = crate::error::ErrorBody),
        (status = 422, description = "Workbook unusable", body = crate::error::ErrorBody),
        (status = 500, description = "Batch write failed", body = crate::error::ErrorBody),
    ),
    tag = "import"
)]
pub async fn import_headers(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<usize>, AppError> {
    let bytes = read_upload(multipart).await?;
    let summary = state
        .importer
        .import_headers(bytes)
        .await
        .map_err(|e| AppError::from(e).context("import failed"))?;
    Ok(ApiResponse::ok(summary.processed()))
}

/// POST /req/import/detail: Import requirement details from a workbook.
#[utoipa::path(
    post,
    path = "/req/import/detail",
    request_body(content_type = "multipart/form-data", description = "Workbook in field `file`"),
    responses(
        (status = 200, description = "Records processed", body = ApiResponse<usize>),
        (status = 400, description = "Upload missing or unreadable", body = crate::error::ErrorBody),
        (status = 422, description = "Workbook unusable", body = crate::error::ErrorBody),
        (status = 500, description = "Batch write failed", body = crate::error::ErrorBody),
    ),
    tag = "import"
)]
pub async fn import_details(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<usize>, AppError> {
    let bytes = read_upload(multipart).await?;
    let summary = state
        .importer
        .import_details(bytes)
        .await
        .map_err(|e| AppError::from(e).context("import failed"))?;
    Ok(ApiResponse::ok(summary.processed()))
}
