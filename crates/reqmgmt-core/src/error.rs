//! # Storage Errors
//!
//! Failures surfaced by [`RecordStore`](crate::RecordStore) engines. Engine
//! specific errors (SQL driver, pool) are flattened into
//! [`StoreError::Backend`] with their message so that callers never depend on
//! a particular engine's error type.

use thiserror::Error;

/// Error returned by record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An insert collided with an existing primary or natural key.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// An update targeted a record that does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The underlying engine failed (connection, statement, transaction).
    #[error("storage backend error: {0}")]
    Backend(String),
}
