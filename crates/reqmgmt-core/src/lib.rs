//! # reqmgmt-core: Foundational Types for Requirement Management
//!
//! Every other crate in the workspace depends on `reqmgmt-core`; it depends
//! on nothing internal.
//!
//! ## Contents
//!
//! - [`record`]: the two persisted record kinds: [`RequirementHeader`]
//!   (keyed by evaluation ticket number) and [`RequirementDetail`] (keyed by
//!   ticket number plus detail name).
//! - [`fields`]: the declared field tables. One ordered table per record
//!   kind drives spreadsheet column lookup, markdown field order, and the SQL
//!   column lists, so the three can never drift apart.
//! - [`query`]: filter and pagination criteria for header search.
//! - [`store`]: the [`RecordStore`] trait that import, export and query
//!   logic depend on, plus the in-memory engine [`MemoryStore`].
//!
//! ## Crate Policy
//!
//! - No `.unwrap()` outside tests.
//! - Storage engines live behind [`RecordStore`]; nothing in this crate
//!   knows about SQL.

pub mod error;
pub mod fields;
pub mod query;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use fields::{
    FieldData, FieldKind, FieldRecord, FieldSlot, FieldSpec, FieldValue, TIMESTAMP_FORMAT,
};
pub use query::{page_query, HeaderFilter, MatchMode, Page, PageRequest, ReqQuery};
pub use record::{is_blank, DetailKey, RequirementDetail, RequirementHeader};
pub use store::{MemoryStore, RecordStore};
