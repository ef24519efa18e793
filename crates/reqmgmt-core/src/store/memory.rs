//! In-memory [`RecordStore`] engine.
//!
//! All state sits behind one `parking_lot::RwLock`, never held across an
//! `.await`. Batch writes validate the whole batch before touching the maps,
//! which gives them the same all-or-nothing behavior as a database
//! transaction.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::query::{HeaderFilter, Page, PageRequest};
use crate::record::{DetailKey, RequirementDetail, RequirementHeader};
use crate::store::RecordStore;

#[derive(Debug, Default)]
struct Inner {
    headers: BTreeMap<String, RequirementHeader>,
    details: BTreeMap<i64, RequirementDetail>,
    detail_keys: HashMap<DetailKey, i64>,
    next_detail_id: i64,
}

/// Thread-safe, cloneable in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored headers.
    pub fn header_count(&self) -> usize {
        self.inner.read().headers.len()
    }

    /// Number of stored details.
    pub fn detail_count(&self) -> usize {
        self.inner.read().details.len()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_header(&self, req_no: &str) -> Result<Option<RequirementHeader>, StoreError> {
        Ok(self.inner.read().headers.get(req_no).cloned())
    }

    async fn find_headers_by_ids(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementHeader>, StoreError> {
        let guard = self.inner.read();
        let wanted: HashSet<&str> = req_nos.iter().map(String::as_str).collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| guard.headers.get(id).cloned())
            .collect())
    }

    async fn find_headers(
        &self,
        filter: &HeaderFilter,
        page: PageRequest,
    ) -> Result<Page<RequirementHeader>, StoreError> {
        let mut matched: Vec<RequirementHeader> = self
            .inner
            .read()
            .headers
            .values()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();

        // Newest submission first; missing submit times sort last.
        matched.sort_by(|a, b| match (a.submit_time, b.submit_time) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let total = matched.len() as u64;
        let records = matched
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();
        Ok(Page::new(records, total, page))
    }

    async fn list_req_nos(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().headers.keys().cloned().collect())
    }

    async fn apply_header_batch(
        &self,
        inserts: &[RequirementHeader],
        updates: &[RequirementHeader],
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write();

        let mut seen = HashSet::new();
        for header in inserts {
            if guard.headers.contains_key(&header.req_no) || !seen.insert(header.req_no.as_str()) {
                return Err(StoreError::DuplicateKey(format!(
                    "req_list.req_no = {}",
                    header.req_no
                )));
            }
        }
        if let Some(missing) = updates
            .iter()
            .find(|h| !guard.headers.contains_key(&h.req_no))
        {
            return Err(StoreError::NotFound(format!(
                "req_list.req_no = {}",
                missing.req_no
            )));
        }

        let stamp = now();
        for header in inserts {
            let mut row = header.clone();
            row.created_at = Some(stamp);
            row.updated_at = Some(stamp);
            guard.headers.insert(row.req_no.clone(), row);
        }
        for header in updates {
            let created_at = guard
                .headers
                .get(&header.req_no)
                .and_then(|existing| existing.created_at);
            let mut row = header.clone();
            row.created_at = created_at;
            row.updated_at = Some(stamp);
            guard.headers.insert(row.req_no.clone(), row);
        }
        Ok(())
    }

    async fn find_details(&self, req_no: &str) -> Result<Vec<RequirementDetail>, StoreError> {
        Ok(self
            .inner
            .read()
            .details
            .values()
            .filter(|d| d.req_no == req_no)
            .cloned()
            .collect())
    }

    async fn find_details_by_req_nos(
        &self,
        req_nos: &[String],
    ) -> Result<Vec<RequirementDetail>, StoreError> {
        let wanted: HashSet<&str> = req_nos.iter().map(String::as_str).collect();
        Ok(self
            .inner
            .read()
            .details
            .values()
            .filter(|d| wanted.contains(d.req_no.as_str()))
            .cloned()
            .collect())
    }

    async fn apply_detail_batch(
        &self,
        inserts: &[RequirementDetail],
        updates: &[RequirementDetail],
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write();

        // Validate the whole batch before the first write.
        let mut incoming: HashMap<DetailKey, Option<i64>> = HashMap::new();
        for detail in inserts {
            let key = detail.key();
            if guard.detail_keys.contains_key(&key) || incoming.insert(key, None).is_some() {
                return Err(StoreError::DuplicateKey(format!(
                    "req_detail (req_no, req_name) = {}",
                    detail.key()
                )));
            }
        }
        for detail in updates {
            let id = detail
                .id
                .filter(|id| guard.details.contains_key(id))
                .ok_or_else(|| StoreError::NotFound(format!("req_detail {}", detail.key())))?;
            let key = detail.key();
            let owner = guard.detail_keys.get(&key).copied();
            if owner.is_some_and(|o| o != id) || incoming.insert(key, Some(id)).is_some() {
                return Err(StoreError::DuplicateKey(format!(
                    "req_detail (req_no, req_name) = {}",
                    detail.key()
                )));
            }
        }

        let stamp = now();
        for detail in inserts {
            guard.next_detail_id += 1;
            let id = guard.next_detail_id;
            let mut row = detail.clone();
            row.id = Some(id);
            row.created_at = Some(stamp);
            row.updated_at = Some(stamp);
            guard.detail_keys.insert(row.key(), id);
            guard.details.insert(id, row);
        }
        for detail in updates {
            let Some(id) = detail.id else { continue };
            let previous = guard.details.get(&id).map(|d| (d.key(), d.created_at));
            if let Some((old_key, created_at)) = previous {
                guard.detail_keys.remove(&old_key);
                let mut row = detail.clone();
                row.created_at = created_at;
                row.updated_at = Some(stamp);
                guard.detail_keys.insert(row.key(), id);
                guard.details.insert(id, row);
            }
        }
        Ok(())
    }
}
