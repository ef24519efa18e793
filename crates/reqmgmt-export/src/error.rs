//! # Export Errors

use std::path::PathBuf;

use reqmgmt_core::StoreError;
use thiserror::Error;

/// Error returned by export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No header is stored under the ticket number.
    #[error("requirement '{0}' not found")]
    NotFound(String),

    /// The document or its directory could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
