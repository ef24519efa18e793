//! # Service Configuration
//!
//! Every option is a command-line flag that can also be set through the
//! environment. Without `DATABASE_URL` the service runs on the in-memory
//! store.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use reqmgmt_import::{ColumnMapping, ImportOptions, DEFAULT_BATCH_SIZE};

/// Default upload limit for spreadsheet imports (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Requirement management API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "reqmgmt-api", version, about)]
pub struct AppConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory markdown documents are written to.
    #[arg(long, env = "MARKDOWN_EXPORT_DIR", default_value = "./export/markdown")]
    pub markdown_export_dir: PathBuf,

    /// Spreadsheet rows parsed and written per batch.
    #[arg(long, env = "IMPORT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub import_batch_size: usize,

    /// How spreadsheet columns are matched to fields: by-header or positional.
    #[arg(long, env = "IMPORT_COLUMN_MAPPING", default_value = "by-header")]
    pub column_mapping: ColumnMapping,

    /// Largest accepted upload, in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// PostgreSQL connection URL. Unset runs the in-memory store.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            batch_size: self.import_batch_size.max(1),
            mapping: self.column_mapping,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            markdown_export_dir: PathBuf::from("./export/markdown"),
            import_batch_size: DEFAULT_BATCH_SIZE,
            column_mapping: ColumnMapping::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            database_url: None,
            log_format: LogFormat::default(),
        }
    }
}
