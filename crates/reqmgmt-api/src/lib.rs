//! # reqmgmt-api: Axum API Service
//!
//! HTTP surface of the requirement management backend. Assembles the query,
//! import and export routers into one application over a shared
//! [`RecordStore`](reqmgmt_core::RecordStore).
//!
//! ## Routes
//!
//! - `/req/list/*`, `/req/detail/*`: header search and lookup
//! - `/req/import/*`: spreadsheet uploads
//! - `/req/export/markdown/*`: markdown export
//! - `/openapi.json`: generated OpenAPI document
//! - `/health/*`: liveness and readiness probes
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → DefaultBodyLimit
//!
//! Handlers hold no business logic: they delegate to `reqmgmt-core`,
//! `reqmgmt-import` and `reqmgmt-export`, and every failure leaves through
//! [`AppError`] as the `{success, message, data}` envelope.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;

pub use error::{ApiResponse, AppError};
pub use state::AppState;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .merge(routes::requirements::router())
        .merge(routes::imports::router())
        .merge(routes::exports::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the router is serving.
async fn readiness() -> &'static str {
    "ready"
}
