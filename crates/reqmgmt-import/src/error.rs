//! # Import Errors
//!
//! Fatal failures of an import run. Per-row problems are not errors at this
//! level: the offending row is logged and skipped (see [`RowError`]).
//!
//! [`RowError`]: crate::sheet::RowError

use reqmgmt_core::StoreError;
use thiserror::Error;

/// Error that aborts an import.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The uploaded bytes are not a readable spreadsheet.
    #[error("unreadable spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    /// The workbook contains no worksheet.
    #[error("spreadsheet contains no worksheet")]
    NoWorksheet,

    /// The first worksheet has no non-empty row to read titles from.
    #[error("spreadsheet has no header row")]
    MissingHeaderRow,

    /// A key column could not be located by its title.
    #[error("required column '{0}' not found in header row")]
    MissingColumn(&'static str),

    /// The blocking reader task did not complete.
    #[error("spreadsheet reader task failed: {0}")]
    Task(String),

    /// A batch write failed. Rows of earlier batches stay committed.
    #[error("import aborted after {committed} committed row(s): {source}")]
    Store {
        committed: usize,
        #[source]
        source: StoreError,
    },
}
