//! # Requirement Query API
//!
//! ## Endpoints
//!
//! - `POST /req/list/page`: filtered, paginated header search
//! - `GET /req/list/{reqNo}`: one header
//! - `GET /req/detail/{reqNo}`: details of a header, ordered by id

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqmgmt_core::{page_query, Page, ReqQuery, RequirementDetail, RequirementHeader};

use crate::error::{ApiResponse, AppError};
use crate::extractors::extract_json;
use crate::state::AppState;

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/req/list/page", post(page_headers))
        .route("/req/list/{req_no}", get(get_header))
        .route("/req/detail/{req_no}", get(list_details))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /req/list/page: Search requirement headers.
#[utoipa::path(
    post,
    path = "/req/list/page",
    request_body = ReqQuery,
    responses(
        (status = 200, description = "One page of headers", body = ApiResponse<Page<RequirementHeader>>),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "requirements"
)]
pub async fn page_headers(
    State(state): State<AppState>,
    body: Result<Json<ReqQuery>, JsonRejection>,
) -> Result<ApiResponse<Page<RequirementHeader>>, AppError> {
    let query = extract_json(body)?;
    let page = page_query(state.store.as_ref(), &query).await?;
    Ok(ApiResponse::ok(page))
}

/// GET /req/list/{reqNo}: Get one requirement header.
#[utoipa::path(
    get,
    path = "/req/list/{reqNo}",
    params(("reqNo" = String, Path, description = "Evaluation ticket number")),
    responses(
        (status = 200, description = "Header found", body = ApiResponse<RequirementHeader>),
        (status = 404, description = "Header not found", body = crate::error::ErrorBody),
    ),
    tag = "requirements"
)]
pub async fn get_header(
    State(state): State<AppState>,
    Path(req_no): Path<String>,
) -> Result<ApiResponse<RequirementHeader>, AppError> {
    state
        .store
        .find_header(&req_no)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound(format!("requirement '{req_no}' not found")))
}

/// GET /req/detail/{reqNo}: List the details of a requirement.
///
/// An unknown ticket number yields an empty list.
#[utoipa::path(
    get,
    path = "/req/detail/{reqNo}",
    params(("reqNo" = String, Path, description = "Evaluation ticket number")),
    responses(
        (status = 200, description = "Details ordered by id", body = ApiResponse<Vec<RequirementDetail>>),
    ),
    tag = "requirements"
)]
pub async fn list_details(
    State(state): State<AppState>,
    Path(req_no): Path<String>,
) -> Result<ApiResponse<Vec<RequirementDetail>>, AppError> {
    let details = state.store.find_details(&req_no).await?;
    Ok(ApiResponse::ok(details))
}
