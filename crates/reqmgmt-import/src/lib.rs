//! # reqmgmt-import: Spreadsheet Import
//!
//! Reads requirement headers and details from uploaded workbooks and
//! upserts them into a [`RecordStore`](reqmgmt_core::RecordStore).
//!
//! ## Pipeline
//!
//! 1. [`sheet`]: decode the workbook and find the header row.
//! 2. [`columns`]: map worksheet columns to declared fields, by header title
//!    or by position.
//! 3. [`cell`]: coerce each cell to its field's kind.
//! 4. [`sheet::RowBatches`]: yield bounded batches of typed records,
//!    skipping rows with blank keys or unparsable cells.
//! 5. [`reconcile`]: split each batch into inserts and updates and write
//!    both in one store transaction.
//!
//! [`Importer`] ties the steps together and returns an [`ImportSummary`].

pub mod cell;
pub mod columns;
pub mod error;
pub mod importer;
pub mod reconcile;
pub mod sheet;

pub use columns::ColumnMapping;
pub use error::ImportError;
pub use importer::{ImportOptions, ImportSummary, Importer, Reconcile, DEFAULT_BATCH_SIZE};
pub use reconcile::{reconcile_details, reconcile_headers, BatchOutcome};
pub use sheet::{RowError, Worksheet};
