//! # Record Store Abstraction
//!
//! Import reconciliation, export and search depend on [`RecordStore`] only,
//! never on a concrete engine. Two engines exist:
//!
//! - [`MemoryStore`] (this crate): `parking_lot`-guarded maps, used in tests
//!   and when the server runs without a database.
//! - `PgStore` (`reqmgmt-api::db`): PostgreSQL through `sqlx`.
//!
//! ## Batch writes
//!
//! [`RecordStore::apply_header_batch`] and
//! [`RecordStore::apply_detail_batch`] write one insert list and one update
//! list atomically: either every row lands or none does. This is the
//! transaction boundary of an import batch.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::{HeaderFilter, Page, PageRequest};
use crate::record::{RequirementDetail, RequirementHeader};

/// Persistence operations for requirement headers and details.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // -- Headers ----------------------------------------------------------------

    /// Fetch one header by ticket number.
    async fn find_header(&self, req_no: &str) -> Result<Option<RequirementHeader>, StoreError>;

    /// Fetch every stored header whose ticket number is in `req_nos`.
    /// Unknown ticket numbers are silently absent from the result.
    async fn find_headers_by_ids(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementHeader>, StoreError>;

    /// Filtered, paginated search ordered by submit time, newest first,
    /// headers without a submit time last.
    async fn find_headers(
        &self,
        filter: &HeaderFilter,
        page: PageRequest,
    ) -> Result<Page<RequirementHeader>, StoreError>;

    /// Every stored ticket number, ascending.
    async fn list_req_nos(&self) -> Result<Vec<String>, StoreError>;

    /// Insert `inserts` and update `updates` (matched by ticket number) in one
    /// transaction. Stamps `created_at` on inserts and `updated_at` on all rows.
    async fn apply_header_batch(
        &self,
        inserts: &[RequirementHeader],
        updates: &[RequirementHeader],
    ) -> Result<(), StoreError>;

    /// Insert one header.
    async fn insert_header(&self, header: &RequirementHeader) -> Result<(), StoreError> {
        self.apply_header_batch(std::slice::from_ref(header), &[])
            .await
    }

    /// Update one header in place, matched by ticket number.
    async fn update_header(&self, header: &RequirementHeader) -> Result<(), StoreError> {
        self.apply_header_batch(&[], std::slice::from_ref(header))
            .await
    }

    // -- Details ----------------------------------------------------------------

    /// Every detail of one ticket number, ordered by surrogate id.
    async fn find_details(&self, req_no: &str) -> Result<Vec<RequirementDetail>, StoreError>;

    /// Every detail whose ticket number is in `req_nos`.
    async fn find_details_by_req_nos(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementDetail>, StoreError>;

    /// Insert `inserts` (new surrogate ids) and update `updates` (matched by
    /// surrogate id) in one transaction.
    async fn apply_detail_batch(
        &self,
        inserts: &[RequirementDetail],
        updates: &[RequirementDetail],
    ) -> Result<(), StoreError>;

    /// Insert one detail.
    async fn insert_detail(&self, detail: &RequirementDetail) -> Result<(), StoreError> {
        self.apply_detail_batch(std::slice::from_ref(detail), &[])
            .await
    }

    /// Update one detail in place, matched by surrogate id.
    async fn update_detail(&self, detail: &RequirementDetail) -> Result<(), StoreError> {
        self.apply_detail_batch(&[], std::slice::from_ref(detail))
            .await
    }
}
