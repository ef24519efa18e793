//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Requirement Management API",
        version = "0.1.0",
        description = "Search requirement headers, import requirement spreadsheets, export requirements as markdown."
    ),
    paths(
        // Query
        crate::routes::requirements::page_headers,
        crate::routes::requirements::get_header,
        crate::routes::requirements::list_details,
        // Import
        crate::routes::imports::import_headers,
        crate::routes::imports::import_details,
        // Export
        crate::routes::exports::export_one,
        crate::routes::exports::markdown_content,
        crate::routes::exports::export_batch,
    ),
    components(schemas(
        reqmgmt_core::RequirementHeader,
        reqmgmt_core::RequirementDetail,
        reqmgmt_core::ReqQuery,
        crate::error::ErrorBody,
        crate::routes::exports::BatchExportRequest,
    )),
    tags(
        (name = "requirements", description = "Requirement header search and lookup"),
        (name = "import", description = "Spreadsheet import"),
        (name = "export", description = "Markdown export"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
