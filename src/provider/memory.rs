//! In-memory providers
//!
//! `MemoryProvider` sorts JSON records by the requested specification on every
//! fetch, so it behaves like a table queried with `ORDER BY`. `VecProvider`
//! serves an already-ordered vector of any item type.
//!
//! Both share their storage between clones, so a test can hand one clone to a
//! reader and keep growing the source through another.

use super::types::{Page, PageProvider, PageRequest};
use crate::error::{Error, Result};
use crate::sort::{SortDirection, SortSpecification};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// ============================================================================
// JSON ordering
// ============================================================================

/// Rank of a JSON value's type in the total order
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Compare two optional JSON values
///
/// Missing and null sort first, then booleans, numbers, strings, arrays and
/// objects. Integers compare exactly; mixed integer/float compare as `f64`.
pub fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x.cmp(&y)
            } else {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y))
            if type_rank(Some(x)) == type_rank(Some(y)) =>
        {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Look up a dotted field path in a JSON record
fn lookup<'v>(record: &'v Value, field: &str) -> Option<&'v Value> {
    field
        .split('.')
        .try_fold(record, |current, part| current.as_object()?.get(part))
}

/// Compare two records under a sort specification
fn compare_records(a: &Value, b: &Value, sort: &SortSpecification) -> Ordering {
    for order in sort {
        let ordering = compare_json(lookup(a, &order.field), lookup(b, &order.field));
        let ordering = match order.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Cut one page out of an ordered slice
fn slice_page<T: Clone>(items: &[T], request: &PageRequest<'_>) -> Page<T> {
    let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    if start >= items.len() {
        return Page::empty();
    }
    let end = start.saturating_add(request.limit()).min(items.len());
    let page = items[start..end].to_vec();
    if end == items.len() {
        Page::last(page)
    } else {
        Page::new(page)
    }
}

// ============================================================================
// Memory Provider
// ============================================================================

/// JSON record source kept in memory
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    /// Provider name (for logging)
    name: String,
    /// Records in insertion order
    records: Arc<RwLock<Vec<Value>>>,
    /// Page indices requested so far
    fetch_log: Arc<Mutex<Vec<u64>>>,
    /// Number of upcoming fetches that should fail
    fail_next: Arc<AtomicU32>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_records(name, Vec::new())
    }

    /// Create a provider over existing records
    pub fn with_records(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(RwLock::new(records)),
            fetch_log: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Load records from a JSON array or JSON Lines document
    pub fn from_json_str(name: impl Into<String>, content: &str) -> Result<Self> {
        let trimmed = content.trim_start();
        let records = if trimmed.starts_with('[') {
            serde_json::from_str::<Vec<Value>>(trimmed)?
        } else {
            trimmed
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<Value>)
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(Self::with_records(name, records))
    }

    /// Append a record to the source
    pub async fn push(&self, record: Value) {
        self.records.write().await.push(record);
    }

    /// Append several records to the source
    pub async fn extend(&self, records: impl IntoIterator<Item = Value>) {
        self.records.write().await.extend(records);
    }

    /// Number of records in the source
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if the source holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Make the next `count` fetches fail with `SourceUnavailable`
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, AtomicOrdering::SeqCst);
    }

    /// Page indices fetched so far, in call order (failed calls included)
    pub async fn fetch_log(&self) -> Vec<u64> {
        self.fetch_log.lock().await.clone()
    }

    /// Consume one pending injected failure, if any
    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl PageProvider<Value> for MemoryProvider {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<Value>> {
        self.fetch_log.lock().await.push(request.page_index);

        if self.take_failure() {
            return Err(Error::source_unavailable(
                &self.name,
                format!("injected failure fetching page {}", request.page_index),
            ));
        }

        let mut ordered = self.records.read().await.clone();
        ordered.sort_by(|a, b| compare_records(a, b, request.sort));

        Ok(slice_page(&ordered, request))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Vec Provider
// ============================================================================

/// Source over a vector that is already in the desired order
///
/// The sort in each request is not applied; callers keep the vector ordered.
#[derive(Debug, Clone)]
pub struct VecProvider<T> {
    name: String,
    items: Arc<RwLock<Vec<T>>>,
}

impl<T> VecProvider<T> {
    /// Create a provider over ordered items
    pub fn new(name: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            name: name.into(),
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Append an item at the end of the ordering
    pub async fn push(&self, item: T) {
        self.items.write().await.push(item);
    }
}

#[async_trait]
impl<T> PageProvider<T> for VecProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<T>> {
        let items = self.items.read().await;
        Ok(slice_page(&items, request))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
