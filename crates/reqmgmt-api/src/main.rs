//! # reqmgmt-api: Binary Entry Point
//!
//! Parses configuration from flags and environment, connects PostgreSQL when
//! `DATABASE_URL` is set, and serves the API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reqmgmt_api::config::{AppConfig, LogFormat};
use reqmgmt_api::db::{self, PgStore};
use reqmgmt_api::AppState;
use reqmgmt_core::{MemoryStore, RecordStore};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_tracing(config.log_format);

    let pool = db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;
    let store: Arc<dyn RecordStore> = match pool {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    tracing::info!(
        export_dir = %config.markdown_export_dir.display(),
        batch_size = config.import_batch_size,
        mapping = %config.column_mapping,
        "configuration loaded"
    );

    let port = config.port;
    let app = reqmgmt_api::app(AppState::with_store(config, store));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("requirement API listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
