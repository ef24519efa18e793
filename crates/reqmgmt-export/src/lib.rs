//! # reqmgmt-export: Markdown Export
//!
//! Turns stored requirements into markdown documents.
//!
//! - [`markdown`]: pure rendering of a header plus its details.
//! - [`exporter`]: loads records from a
//!   [`RecordStore`](reqmgmt_core::RecordStore) and writes documents to the
//!   export directory, one file per ticket number.

pub mod error;
pub mod exporter;
pub mod markdown;

pub use error::ExportError;
pub use exporter::{file_name, Exporter};
pub use markdown::render;
