//! Provider types and traits
//!
//! Defines the page request/response values and the provider abstraction.

use crate::error::Result;
use crate::sort::SortSpecification;
use async_trait::async_trait;
use std::sync::Arc;

/// Parameters of a single page fetch
///
/// Built fresh by the reader for every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// Zero-based page index
    pub page_index: u64,
    /// Items per page (always positive)
    pub page_size: u32,
    /// Ordering the page must be cut from
    pub sort: &'a SortSpecification,
}

impl<'a> PageRequest<'a> {
    /// Create a page request
    pub fn new(page_index: u64, page_size: u32, sort: &'a SortSpecification) -> Self {
        Self {
            page_index,
            page_size,
            sort,
        }
    }

    /// Index of the first item of this page in the full ordering
    pub fn offset(&self) -> u64 {
        self.page_index.saturating_mul(u64::from(self.page_size))
    }

    /// Page size as a `usize` for slicing
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

/// One page of items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    last: bool,
}

impl<T> Page<T> {
    /// Create a page that may be followed by more data
    pub fn new(items: Vec<T>) -> Self {
        Self { items, last: false }
    }

    /// Create a page the provider knows to be the final one
    pub fn last(items: Vec<T>) -> Self {
        Self { items, last: true }
    }

    /// Create an empty page (no data at this index)
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            last: true,
        }
    }

    /// Items on this page, in order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page into its items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Keep at most `len` items
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Check if the page holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Provider hint that nothing follows this page
    ///
    /// Informational only; an empty page is what ends a stream.
    pub fn is_last(&self) -> bool {
        self.last || self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Vec<T>> for Page<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Core trait for page-addressable sources
#[async_trait]
pub trait PageProvider<T>: Send + Sync {
    /// Fetch the items of one page
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<T>>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        "provider"
    }
}

#[async_trait]
impl<T, P> PageProvider<T> for Arc<P>
where
    T: Send + 'static,
    P: PageProvider<T> + ?Sized,
{
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<T>> {
        (**self).fetch_page(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T, P> PageProvider<T> for Box<P>
where
    T: Send + 'static,
    P: PageProvider<T> + ?Sized,
{
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<T>> {
        (**self).fetch_page(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
