//! # Header Query Criteria
//!
//! [`ReqQuery`] is the search request as received from a client: optional
//! filter values plus 1-based paging. [`ReqQuery::criteria`] normalizes it
//! into a [`HeaderFilter`] and a [`PageRequest`]; [`page_query`] hands both
//! to a [`RecordStore`].
//!
//! Matching rules:
//! - blank filter values are dropped, they do not mean "match empty";
//! - `status` matches by exact equality;
//! - every other filter is a case-sensitive substring match.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StoreError;
use crate::fields::{FieldRecord, FieldValue};
use crate::record::{is_blank, RequirementHeader};
use crate::store::RecordStore;

/// Default page size when the client sends none or a non-positive one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page a single request may ask for.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Header search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReqQuery {
    pub req_no: Option<String>,
    pub project_name: Option<String>,
    pub opportunity_no: Option<String>,
    pub industry: Option<String>,
    pub region: Option<String>,
    pub product_series: Option<String>,
    pub software_version: Option<String>,
    /// Matched exactly, not as a substring.
    pub status: Option<String>,
    pub req_owner: Option<String>,
    pub owner_dept: Option<String>,
    pub dev_no: Option<String>,
    pub jkn_no: Option<String>,
    /// 1-based page number (default 1).
    #[schema(example = 1)]
    pub current: Option<i64>,
    /// Page size (default 10).
    #[schema(example = 10)]
    pub size: Option<i64>,
}

impl ReqQuery {
    /// Split into normalized filter and paging criteria.
    pub fn criteria(&self) -> (HeaderFilter, PageRequest) {
        let mut filter = HeaderFilter::default();
        filter.contains("req_no", self.req_no.as_deref());
        filter.contains("project_name", self.project_name.as_deref());
        filter.contains("opportunity_no", self.opportunity_no.as_deref());
        filter.contains("industry", self.industry.as_deref());
        filter.contains("region", self.region.as_deref());
        filter.contains("product_series", self.product_series.as_deref());
        filter.contains("software_version", self.software_version.as_deref());
        filter.exact("status", self.status.as_deref());
        filter.contains("req_owner", self.req_owner.as_deref());
        filter.contains("owner_dept", self.owner_dept.as_deref());
        filter.contains("dev_no", self.dev_no.as_deref());
        filter.contains("jkn_no", self.jkn_no.as_deref());

        (filter, PageRequest::new(self.current, self.size))
    }
}

/// How a filter term compares against the stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-sensitive substring.
    Contains,
    /// Exact equality.
    Exact,
}

/// One active filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    /// Column name from [`RequirementHeader::FIELDS`].
    pub column: &'static str,
    pub value: String,
    pub mode: MatchMode,
}

impl FilterTerm {
    /// Whether `candidate` satisfies this term. Absent values never match.
    pub fn accepts(&self, candidate: Option<&str>) -> bool {
        match (candidate, self.mode) {
            (None, _) => false,
            (Some(c), MatchMode::Contains) => c.contains(self.value.as_str()),
            (Some(c), MatchMode::Exact) => c == self.value,
        }
    }
}

/// Conjunction of filter terms over text columns of [`RequirementHeader`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFilter {
    terms: Vec<FilterTerm>,
}

impl HeaderFilter {
    /// Add a substring term; blank values are ignored.
    pub fn contains(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        self.push(column, value, MatchMode::Contains)
    }

    /// Add an exact-match term; blank values are ignored.
    pub fn exact(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        self.push(column, value, MatchMode::Exact)
    }

    fn push(&mut self, column: &'static str, value: Option<&str>, mode: MatchMode) -> &mut Self {
        if let Some(v) = value.filter(|v| !is_blank(v)) {
            self.terms.push(FilterTerm {
                column,
                value: v.to_string(),
                mode,
            });
        }
        self
    }

    /// Active terms, in insertion order.
    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the filter against an in-memory header.
    pub fn matches(&self, header: &RequirementHeader) -> bool {
        let values = header.values();
        self.terms.iter().all(|term| {
            let position = RequirementHeader::FIELDS
                .iter()
                .position(|f| f.name == term.column);
            match position.map(|i| values[i]) {
                Some(FieldValue::Text(v)) => term.accepts(v),
                _ => false,
            }
        })
    }
}

/// Normalized 1-based paging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub current: u64,
    pub size: u64,
}

impl PageRequest {
    /// Clamp raw client values: page below 1 becomes 1, size below 1 becomes
    /// [`DEFAULT_PAGE_SIZE`], size above [`MAX_PAGE_SIZE`] is capped.
    pub fn new(current: Option<i64>, size: Option<i64>) -> Self {
        let current = current.filter(|c| *c >= 1).map_or(1, |c| c as u64);
        let size = size
            .filter(|s| *s >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |s| (s as u64).min(MAX_PAGE_SIZE));
        Self { current, size }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        (self.current - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the totals a pagination widget needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Number of records matching the filter across all pages.
    pub total: u64,
    pub size: u64,
    pub current: u64,
    /// `ceil(total / size)`.
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            records,
            total,
            size: request.size,
            current: request.current,
            pages: total.div_ceil(request.size),
        }
    }
}

/// Run a header search: normalize the request and delegate to the store.
pub async fn page_query(
    store: &dyn RecordStore,
    query: &ReqQuery,
) -> Result<Page<RequirementHeader>, StoreError> {
    let (filter, page) = query.criteria();
    tracing::debug!(
        terms = filter.terms().len(),
        current = page.current,
        size = page.size,
        "querying requirement headers"
    );
    store.find_headers(&filter, page).await
}
