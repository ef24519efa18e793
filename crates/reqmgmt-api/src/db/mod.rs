//! # Database Persistence Layer
//!
//! PostgreSQL engine for [`RecordStore`] via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, headers
//! and details live in PostgreSQL (`req_list`, `req_detail`). When absent,
//! the API runs on the in-memory store, suitable for development and tests.
//!
//! Column lists are derived from the declared field tables in
//! `reqmgmt-core`, so the SQL always matches the record structs.

pub mod details;
pub mod headers;
mod sql;

use std::time::Duration;

use async_trait::async_trait;
use reqmgmt_core::{
    HeaderFilter, Page, PageRequest, RecordStore, RequirementDetail, RequirementHeader, StoreError,
};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if no URL is configured (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = url else {
        tracing::warn!(
            "DATABASE_URL not set, running on the in-memory store. \
             Data will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    // Run embedded migrations.
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Map a driver error onto the engine-neutral [`StoreError`].
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateKey(db.message().to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

/// [`RecordStore`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_header(&self, req_no: &str) -> Result<Option<RequirementHeader>, StoreError> {
        headers::get_by_req_no(&self.pool, req_no)
            .await
            .map_err(store_error)
    }

    async fn find_headers_by_ids(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementHeader>, StoreError> {
        headers::list_by_req_nos(&self.pool, req_nos)
            .await
            .map_err(store_error)
    }

    async fn find_headers(
        &self,
        filter: &HeaderFilter,
        page: PageRequest,
    ) -> Result<Page<RequirementHeader>, StoreError> {
        headers::search(&self.pool, filter, page)
            .await
            .map_err(store_error)
    }

    async fn list_req_nos(&self) -> Result<Vec<String>, StoreError> {
        headers::list_req_nos(&self.pool).await.map_err(store_error)
    }

    async fn apply_header_batch(
        &self,
        inserts: &[RequirementHeader],
        updates: &[RequirementHeader],
    ) -> Result<(), StoreError> {
        headers::apply_batch(&self.pool, inserts, updates)
            .await
            .map_err(store_error)
    }

    async fn find_details(&self, req_no: &str) -> Result<Vec<RequirementDetail>, StoreError> {
        details::list_by_req_no(&self.pool, req_no)
            .await
            .map_err(store_error)
    }

    async fn find_details_by_req_nos(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementDetail>, StoreError> {
        details::list_by_req_nos(&self.pool, req_nos)
            .await
            .map_err(store_error)
    }

    async fn apply_detail_batch(
        &self,
        inserts: &[RequirementDetail],
        updates: &[RequirementDetail],
    ) -> Result<(), StoreError> {
        details::apply_batch(&self.pool, inserts, updates)
            .await
            .map_err(store_error)
    }
}
