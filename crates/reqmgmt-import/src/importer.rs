//! # Importer
//!
//! Drives one upload end to end: decode the workbook on the blocking pool,
//! resolve the column layout, then parse, reconcile and write batch after
//! batch. Totals are accumulated in the returned [`ImportSummary`].

use std::sync::Arc;

use async_trait::async_trait;
use reqmgmt_core::{FieldRecord, RecordStore, RequirementDetail, RequirementHeader, StoreError};
use serde::{Deserialize, Serialize};

use crate::columns::{ColumnLayout, ColumnMapping};
use crate::error::ImportError;
use crate::reconcile::{reconcile_details, reconcile_headers, BatchOutcome};
use crate::sheet::Worksheet;

/// Default number of data rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A record kind that can be reconciled against a store.
#[async_trait]
pub trait Reconcile: FieldRecord {
    async fn reconcile(
        store: &dyn RecordStore,
        batch: Vec<Self>,
    ) -> Result<BatchOutcome, StoreError>;
}

#[async_trait]
impl Reconcile for RequirementHeader {
    async fn reconcile(
        store: &dyn RecordStore,
        batch: Vec<Self>,
    ) -> Result<BatchOutcome, StoreError> {
        reconcile_headers(store, batch).await
    }
}

#[async_trait]
impl Reconcile for RequirementDetail {
    async fn reconcile(
        store: &dyn RecordStore,
        batch: Vec<Self>,
    ) -> Result<BatchOutcome, StoreError> {
        reconcile_details(store, batch).await
    }
}

/// Import tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub batch_size: usize,
    pub mapping: ColumnMapping,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mapping: ColumnMapping::default(),
        }
    }
}

/// Totals of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Data rows rejected for blank keys or unparsable cells.
    pub skipped: usize,
    /// Batches written.
    pub batches: usize,
}

impl ImportSummary {
    /// Records inserted plus records updated.
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }

    fn absorb(&mut self, outcome: BatchOutcome) {
        self.inserted += outcome.inserted;
        self.updated += outcome.updated;
        self.batches += 1;
    }
}

/// Spreadsheet importer bound to a record store.
#[derive(Clone)]
pub struct Importer {
    store: Arc<dyn RecordStore>,
    options: ImportOptions,
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Importer {
    pub fn new(store: Arc<dyn RecordStore>, options: ImportOptions) -> Self {
        Self { store, options }
    }

    /// Import requirement headers from workbook bytes.
    pub async fn import_headers(&self, bytes: Vec<u8>) -> Result<ImportSummary, ImportError> {
        let sheet = read_sheet(bytes).await?;
        self.import_sheet::<RequirementHeader>(&sheet).await
    }

    /// Import requirement details from workbook bytes.
    pub async fn import_details(&self, bytes: Vec<u8>) -> Result<ImportSummary, ImportError> {
        let sheet = read_sheet(bytes).await?;
        self.import_sheet::<RequirementDetail>(&sheet).await
    }

    /// Import records of kind `T` from an already decoded worksheet.
    pub async fn import_sheet<T: Reconcile>(
        &self,
        sheet: &Worksheet,
    ) -> Result<ImportSummary, ImportError> {
        let (_, titles) = sheet.header_row()?;
        let layout = ColumnLayout::resolve::<T>(titles, self.options.mapping)?;
        tracing::info!(
            kind = T::KIND,
            rows = sheet.height(),
            columns = layout.resolved(),
            mapping = %self.options.mapping,
            "starting spreadsheet import"
        );

        let mut summary = ImportSummary::default();
        for batch in sheet.batches::<T>(&layout, self.options.batch_size)? {
            summary.skipped += batch.skipped;
            if batch.records.is_empty() {
                continue;
            }
            let outcome = T::reconcile(self.store.as_ref(), batch.records)
                .await
                .map_err(|source| {
                    tracing::error!(
                        kind = T::KIND,
                        committed = summary.processed(),
                        error = %source,
                        "import batch failed, rolled back"
                    );
                    ImportError::Store {
                        committed: summary.processed(),
                        source,
                    }
                })?;
            summary.absorb(outcome);
        }

        tracing::info!(
            kind = T::KIND,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            batches = summary.batches,
            "spreadsheet import finished"
        );
        Ok(summary)
    }
}

/// Decode workbook bytes on the blocking pool.
async fn read_sheet(bytes: Vec<u8>) -> Result<Worksheet, ImportError> {
    tokio::task::spawn_blocking(move || Worksheet::from_bytes(bytes))
        .await
        .map_err(|e| ImportError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::tests::range_of;
    use proptest::prelude::*;
    use reqmgmt_core::{HeaderFilter, MemoryStore, Page, PageRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn importer(store: &MemoryStore, batch_size: usize) -> Importer {
        Importer::new(
            Arc::new(store.clone()),
            ImportOptions {
                batch_size,
                ..ImportOptions::default()
            },
        )
    }

    fn header_sheet(rows: &[(&str, &str)]) -> Worksheet {
        let mut all: Vec<&[&str]> = Vec::new();
        let titles: &[&str] = &["需求评估单号", "项目名称"];
        all.push(titles);
        let owned: Vec<[&str; 2]> = rows.iter().map(|(a, b)| [*a, *b]).collect();
        for row in &owned {
            all.push(row);
        }
        Worksheet::from_range(range_of(&all))
    }

    #[tokio::test]
    async fn imports_headers_and_reports_totals() {
        let store = MemoryStore::new();
        let sheet = header_sheet(&[("REQ-1", "Apollo"), ("", "orphan"), ("REQ-2", "Gemini")]);

        let summary = importer(&store, 1000)
            .import_sheet::<RequirementHeader>(&sheet)
            .await
            .unwrap();

        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.batches, 1);
        assert_eq!(store.header_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_across_batches_becomes_update() {
        let store = MemoryStore::new();
        let sheet = header_sheet(&[("REQ-1", "first"), ("REQ-1", "second")]);

        let summary = importer(&store, 1)
            .import_sheet::<RequirementHeader>(&sheet)
            .await
            .unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.batches, 2);
        let stored = store.find_header("REQ-1").await.unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn duplicate_within_batch_inserts_once() {
        let store = MemoryStore::new();
        let sheet = header_sheet(&[("REQ-1", "first"), ("REQ-1", "second")]);

        let summary = importer(&store, 1000)
            .import_sheet::<RequirementHeader>(&sheet)
            .await
            .unwrap();

        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.inserted, 1);
        let stored = store.find_header("REQ-1").await.unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn imports_details_keyed_by_ticket_and_name() {
        let store = MemoryStore::new();
        let sheet = Worksheet::from_range(range_of(&[
            &["需求评估单号", "需求名称", "需求描述"],
            &["REQ-1", "login", "v1"],
            &["REQ-1", "logout", "v1"],
            &["REQ-1", "", "nameless"],
        ]));
        let imp = importer(&store, 1000);

        let first = imp.import_sheet::<RequirementDetail>(&sheet).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped, 1);

        let again = imp.import_sheet::<RequirementDetail>(&sheet).await.unwrap();
        assert_eq!(again.updated, 2);
        assert_eq!(store.detail_count(), 2);
    }

    #[tokio::test]
    async fn positional_mapping_still_consumes_header_row() {
        let store = MemoryStore::new();
        let sheet = Worksheet::from_range(range_of(&[
            &["单号", "名称"],
            &["REQ-1", "Apollo"],
            &["REQ-2", "Gemini"],
        ]));
        let imp = Importer::new(
            Arc::new(store.clone()),
            ImportOptions {
                mapping: ColumnMapping::Positional,
                ..ImportOptions::default()
            },
        );

        let summary = imp.import_sheet::<RequirementHeader>(&sheet).await.unwrap();
        assert_eq!(summary.processed(), 2);
        assert!(store.find_header("单号").await.unwrap().is_none());
        let stored = store.find_header("REQ-2").await.unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("Gemini"));
    }

    #[tokio::test]
    async fn missing_key_column_aborts_before_writing() {
        let store = MemoryStore::new();
        let sheet = Worksheet::from_range(range_of(&[&["项目名称"], &["Apollo"]]));
        let err = importer(&store, 1000)
            .import_sheet::<RequirementHeader>(&sheet)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("需求评估单号")));
        assert_eq!(store.header_count(), 0);
    }

    /// Delegates to a [`MemoryStore`] but fails the n-th header batch write.
    struct FailingStore {
        inner: MemoryStore,
        fail_on: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn find_header(&self, req_no: &str) -> Result<Option<RequirementHeader>, StoreError> {
            self.inner.find_header(req_no).await
        }

        async fn find_headers_by_ids(
            &self,
            req_nos: &[String],
        ) -> Result<Vec<RequirementHeader>, StoreError> {
            self.inner.find_headers_by_ids(req_nos).await
        }

        async fn find_headers(
            &self,
            filter: &HeaderFilter,
            page: PageRequest,
        ) -> Result<Page<RequirementHeader>, StoreError> {
            self.inner.find_headers(filter, page).await
        }

        async fn list_req_nos(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_req_nos().await
        }

        async fn apply_header_batch(
            &self,
            inserts: &[RequirementHeader],
            updates: &[RequirementHeader],
        ) -> Result<(), StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(StoreError::Backend("connection reset".into()));
            }
            self.inner.apply_header_batch(inserts, updates).await
        }

        async fn find_details(&self, req_no: &str) -> Result<Vec<RequirementDetail>, StoreError> {
            self.inner.find_details(req_no).await
        }

        async fn find_details_by_req_nos(
            &self,
            req_nos: &[String],
        ) -> Result<Vec<RequirementDetail>, StoreError> {
            self.inner.find_details_by_req_nos(req_nos).await
        }

        async fn apply_detail_batch(
            &self,
            inserts: &[RequirementDetail],
            updates: &[RequirementDetail],
        ) -> Result<(), StoreError> {
            self.inner.apply_detail_batch(inserts, updates).await
        }
    }

    #[tokio::test]
    async fn store_failure_keeps_earlier_batches() {
        let memory = MemoryStore::new();
        let store = FailingStore {
            inner: memory.clone(),
            fail_on: 2,
            calls: AtomicUsize::new(0),
        };
        let imp = Importer::new(
            Arc::new(store),
            ImportOptions {
                batch_size: 2,
                ..ImportOptions::default()
            },
        );
        let sheet = header_sheet(&[("A", ""), ("B", ""), ("C", ""), ("D", ""), ("E", "")]);

        let err = imp
            .import_sheet::<RequirementHeader>(&sheet)
            .await
            .unwrap_err();
        match err {
            ImportError::Store { committed, source } => {
                assert_eq!(committed, 2);
                assert!(matches!(source, StoreError::Backend(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(memory.header_count(), 2);
        assert!(memory.find_header("C").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_upload_is_a_workbook_error() {
        let store = MemoryStore::new();
        let err = importer(&store, 10)
            .import_headers(b"plain text".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Workbook(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn importing_twice_keeps_one_record_per_key(
            keys in proptest::collection::vec("[A-D][0-9]", 1..20),
            batch_size in 1usize..6,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = MemoryStore::new();
            let rows: Vec<(&str, &str)> = keys.iter().map(|k| (k.as_str(), "p")).collect();
            let sheet = header_sheet(&rows);
            let imp = importer(&store, batch_size);

            runtime.block_on(imp.import_sheet::<RequirementHeader>(&sheet)).unwrap();
            let second = runtime.block_on(imp.import_sheet::<RequirementHeader>(&sheet)).unwrap();

            let mut distinct = keys.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(store.header_count(), distinct.len());
            prop_assert_eq!(second.inserted, 0);
        }
    }
}
