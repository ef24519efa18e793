//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. The store is shared by the importer, the exporter
//! and the query handlers.

use std::sync::Arc;

use reqmgmt_core::RecordStore;
use reqmgmt_export::Exporter;
use reqmgmt_import::Importer;

pub use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub importer: Importer,
    pub exporter: Exporter,
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("importer", &self.importer)
            .field("exporter", &self.exporter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State over an explicit store.
    pub fn with_store(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let importer = Importer::new(Arc::clone(&store), config.import_options());
        let exporter = Exporter::new(Arc::clone(&store), config.markdown_export_dir.clone());
        Self {
            store,
            importer,
            exporter,
            config: Arc::new(config),
        }
    }
}
