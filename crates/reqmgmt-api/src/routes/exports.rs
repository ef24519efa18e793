//! # Markdown Export API
//!
//! ## Endpoints
//!
//! - `GET /req/export/markdown/{reqNo}`: write one document, return its path
//! - `GET /req/export/markdown/{reqNo}/content`: rendered markdown, no write
//! - `POST /req/export/markdown/batch`: write several documents

use std::path::Path as FsPath;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ApiResponse, AppError};
use crate::extractors::extract_json;
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

/// Batch export request. Absent or empty `reqNos` exports every header.
/// Unknown or blank ticket numbers fail individually and are skipped.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchExportRequest {
    #[serde(default)]
    pub req_nos: Option<Vec<String>>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/req/export/markdown/batch", post(export_batch))
        .route("/req/export/markdown/{req_no}", get(export_one))
        .route("/req/export/markdown/{req_no}/content", get(markdown_content))
}

fn display(path: &FsPath) -> String {
    path.display().to_string()
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /req/export/markdown/{reqNo}: Export one requirement.
#[utoipa::path(
    get,
    path = "/req/export/markdown/{reqNo}",
    params(("reqNo" = String, Path, description = "Evaluation ticket number")),
    responses(
        (status = 200, description = "Path of the written document", body = ApiResponse<String>),
        (status = 404, description = "Requirement not found", body = crate::error::ErrorBody),
        (status = 500, description = "Write failed", body = crate::error::ErrorBody),
    ),
    tag = "export"
)]
pub async fn export_one(
    State(state): State<AppState>,
    Path(req_no): Path<String>,
) -> Result<ApiResponse<String>, AppError> {
    let path = state
        .exporter
        .export_one(&req_no)
        .await
        .map_err(|e| AppError::from(e).context("export failed"))?;
    Ok(ApiResponse::ok(display(&path)))
}

/// GET /req/export/markdown/{reqNo}/content: Render one requirement.
#[utoipa::path(
    get,
    path = "/req/export/markdown/{reqNo}/content",
    params(("reqNo" = String, Path, description = "Evaluation ticket number")),
    responses(
        (status = 200, description = "Markdown text", body = ApiResponse<String>),
        (status = 404, description = "Requirement not found", body = crate::error::ErrorBody),
    ),
    tag = "export"
)]
pub async fn markdown_content(
    State(state): State<AppState>,
    Path(req_no): Path<String>,
) -> Result<ApiResponse<String>, AppError> {
    let content = state.exporter.render(&req_no).await?;
    Ok(ApiResponse::ok(content))
}

/// POST /req/export/markdown/batch: Export several requirements.
///
/// Items that fail are logged and left out of the returned paths.
#[utoipa::path(
    post,
    path = "/req/export/markdown/batch",
    request_body = BatchExportRequest,
    responses(
        (status = 200, description = "Paths of the written documents", body = ApiResponse<Vec<String>>),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
    ),
    tag = "export"
)]
pub async fn export_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchExportRequest>, JsonRejection>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    let req = extract_json(body)?;
    let req_nos = req.req_nos.unwrap_or_default();
    let paths = state
        .exporter
        .export_batch(&req_nos)
        .await
        .map_err(|e| AppError::from(e).context("export failed"))?;
    Ok(ApiResponse::ok(paths.iter().map(|p| display(p)).collect()))
}
