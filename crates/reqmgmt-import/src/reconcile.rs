//! # Import Reconciliation
//!
//! Turns one batch of parsed records into an insert list and an update list
//! and writes both through a single [`RecordStore`] batch call.
//!
//! Duplicates inside a batch are collapsed before the existence probe: the
//! last occurrence supplies the values, the first occurrence keeps its
//! position. Duplicates across batches need no special care, since an
//! earlier batch is already committed when a later one is probed.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use reqmgmt_core::{
    is_blank, DetailKey, RecordStore, RequirementDetail, RequirementHeader, StoreError,
};

/// Outcome of one reconciled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub updated: usize,
}

impl BatchOutcome {
    /// Records written, inserts plus updates.
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// A batch split into records to insert and records to update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan<T> {
    pub inserts: Vec<T>,
    pub updates: Vec<T>,
}

/// Collapse records sharing a key: last values win, first position is kept.
pub fn collapse_by_key<T, K, F>(records: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: Vec<T> = Vec::with_capacity(records.len());
    let mut positions: HashMap<K, usize> = HashMap::new();

    for record in records {
        let k = key(&record);
        match positions.get(&k) {
            Some(&at) => slots[at] = record,
            None => {
                positions.insert(k, slots.len());
                slots.push(record);
            }
        }
    }
    slots
}

/// Split headers by whether their ticket number is already stored.
pub fn plan_headers(
    records: Vec<RequirementHeader>,
    existing: &HashSet<String>,
) -> Plan<RequirementHeader> {
    let (updates, inserts): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|h| existing.contains(&h.req_no));
    Plan { inserts, updates }
}

/// Split details by whether their natural key is already stored, copying the
/// stored surrogate id onto each update.
pub fn plan_details(
    records: Vec<RequirementDetail>,
    existing: &HashMap<DetailKey, i64>,
) -> Plan<RequirementDetail> {
    let mut plan = Plan::default();
    for mut detail in records {
        match existing.get(&detail.key()) {
            Some(&id) => {
                detail.id = Some(id);
                plan.updates.push(detail);
            }
            None => {
                detail.id = None;
                plan.inserts.push(detail);
            }
        }
    }
    plan
}

fn header_key(header: &RequirementHeader) -> String {
    header.req_no.clone()
}

fn detail_key(detail: &RequirementDetail) -> DetailKey {
    detail.key()
}

/// Reconcile and write one batch of headers.
pub async fn reconcile_headers(
    store: &dyn RecordStore,
    records: Vec<RequirementHeader>,
) -> Result<BatchOutcome, StoreError> {
    if records.is_empty() {
        return Ok(BatchOutcome::default());
    }
    let records = collapse_by_key(records, header_key);

    let ids: Vec<String> = records.iter().map(|h| h.req_no.clone()).collect();
    let existing: HashSet<String> = store
        .find_headers_by_ids(&ids)
        .await?
        .into_iter()
        .map(|h| h.req_no)
        .collect();

    let plan = plan_headers(records, &existing);
    store.apply_header_batch(&plan.inserts, &plan.updates).await?;

    let outcome = BatchOutcome {
        inserted: plan.inserts.len(),
        updated: plan.updates.len(),
    };
    tracing::info!(
        kind = "requirement header",
        inserted = outcome.inserted,
        updated = outcome.updated,
        "batch reconciled"
    );
    Ok(outcome)
}

/// Reconcile and write one batch of details.
///
/// Details without a ticket number have no natural key; they are dropped
/// with a warning, like spreadsheet rows with a blank key.
pub async fn reconcile_details(
    store: &dyn RecordStore,
    records: Vec<RequirementDetail>,
) -> Result<BatchOutcome, StoreError> {
    let (records, unkeyed): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|d| !is_blank(&d.req_no));
    for detail in &unkeyed {
        tracing::warn!(req_name = %detail.req_name, "skipping detail without ticket number");
    }
    if records.is_empty() {
        return Ok(BatchOutcome::default());
    }
    let records = collapse_by_key(records, detail_key);

    let mut req_nos: Vec<String> = records.iter().map(|d| d.req_no.clone()).collect();
    req_nos.sort_unstable();
    req_nos.dedup();

    let existing: HashMap<DetailKey, i64> = if req_nos.is_empty() {
        HashMap::new()
    } else {
        store
            .find_details_by_req_nos(&req_nos)
            .await?
            .into_iter()
            .filter_map(|d| d.id.map(|id| (d.key(), id)))
            .collect()
    };

    let plan = plan_details(records, &existing);
    store.apply_detail_batch(&plan.inserts, &plan.updates).await?;

    let outcome = BatchOutcome {
        inserted: plan.inserts.len(),
        updated: plan.updates.len(),
    };
    tracing::info!(
        kind = "requirement detail",
        inserted = outcome.inserted,
        updated = outcome.updated,
        "batch reconciled"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqmgmt_core::MemoryStore;

    fn header(req_no: &str, project: &str) -> RequirementHeader {
        let mut h = RequirementHeader::new(req_no);
        h.project_name = Some(project.into());
        h
    }

    #[test]
    fn collapse_keeps_first_position_and_last_values() {
        let rows = vec![header("A", "1"), header("B", "2"), header("A", "3")];
        let collapsed = collapse_by_key(rows, header_key);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].req_no, "A");
        assert_eq!(collapsed[0].project_name.as_deref(), Some("3"));
        assert_eq!(collapsed[1].req_no, "B");
    }

    #[test]
    fn collapse_merges_details_on_natural_key() {
        let rows = vec![
            RequirementDetail::new("R", "x"),
            RequirementDetail::new("R", "y"),
            RequirementDetail::new("R", "x"),
        ];
        assert_eq!(collapse_by_key(rows, detail_key).len(), 2);
    }

    #[tokio::test]
    async fn details_without_ticket_are_skipped() {
        let store = MemoryStore::new();
        let batch = vec![
            RequirementDetail::new("", "x"),
            RequirementDetail::new("  ", "x"),
            RequirementDetail::new("R", "x"),
        ];
        let outcome = reconcile_details(&store, batch).await.unwrap();
        assert_eq!(outcome, BatchOutcome { inserted: 1, updated: 0 });
        assert_eq!(store.detail_count(), 1);

        let again = reconcile_details(&store, vec![RequirementDetail::new("", "y")])
            .await
            .unwrap();
        assert_eq!(again, BatchOutcome::default());
        assert_eq!(store.detail_count(), 1);
    }

    #[test]
    fn detail_plan_copies_stored_id() {
        let mut existing = HashMap::new();
        existing.insert(RequirementDetail::new("R", "a").key(), 7);
        let plan = plan_details(
            vec![RequirementDetail::new("R", "a"), RequirementDetail::new("R", "b")],
            &existing,
        );
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, Some(7));
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].req_name, "b");
    }

    #[tokio::test]
    async fn duplicate_rows_for_absent_ticket_insert_once() {
        let store = MemoryStore::new();
        let batch = vec![header("REQ-1", "first"), header("REQ-1", "second")];
        let outcome = reconcile_headers(&store, batch).await.unwrap();

        assert_eq!(outcome, BatchOutcome { inserted: 1, updated: 0 });
        assert_eq!(outcome.processed(), 1);
        let stored = store.find_header("REQ-1").await.unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn existing_headers_are_updated() {
        let store = MemoryStore::new();
        store.insert_header(&header("REQ-1", "old")).await.unwrap();

        let batch = vec![header("REQ-1", "new"), header("REQ-2", "x")];
        let outcome = reconcile_headers(&store, batch).await.unwrap();
        assert_eq!(outcome, BatchOutcome { inserted: 1, updated: 1 });
        assert_eq!(store.header_count(), 2);
        let stored = store.find_header("REQ-1").await.unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn details_upsert_on_natural_key() {
        let store = MemoryStore::new();
        reconcile_details(&store, vec![RequirementDetail::new("R", "a")])
            .await
            .unwrap();

        let mut changed = RequirementDetail::new("R", "a");
        changed.req_desc = Some("v2".into());
        let outcome = reconcile_details(&store, vec![changed, RequirementDetail::new("R", "b")])
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { inserted: 1, updated: 1 });
        let details = store.find_details("R").await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].req_desc.as_deref(), Some("v2"));
        assert_eq!(details[0].id, Some(1));
    }

    #[tokio::test]
    async fn same_name_under_different_tickets_are_distinct() {
        let store = MemoryStore::new();
        let outcome = reconcile_details(
            &store,
            vec![RequirementDetail::new("R1", "login"), RequirementDetail::new("R2", "login")],
        )
        .await
        .unwrap();
        assert_eq!(outcome.inserted, 2);
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let store = MemoryStore::new();
        let outcome = reconcile_headers(&store, Vec::new()).await.unwrap();
        assert_eq!(outcome, BatchOutcome::default());
    }
}
