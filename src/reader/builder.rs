//! Fluent reader construction

use super::{PaginatedReader, ReaderState};
use crate::config::{ReaderConfig, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::provider::PageProvider;
use crate::sort::{SortDirection, SortOrder, SortSpecification};
use std::marker::PhantomData;

/// Builder for `PaginatedReader`
///
/// ```rust,ignore
/// let reader = ReaderBuilder::new()
///     .provider(provider)
///     .name("users-reader")
///     .page_size(100)
///     .sorts([("id", SortDirection::Ascending)])
///     .build()?;
/// ```
pub struct ReaderBuilder<T, P> {
    provider: Option<P>,
    name: Option<String>,
    page_size: u32,
    sorts: Vec<SortOrder>,
    save_state: bool,
    max_item_count: Option<u64>,
    saved_state: Option<ReaderState>,
    _item: PhantomData<fn() -> T>,
}

impl<T, P> Default for ReaderBuilder<T, P> {
    fn default() -> Self {
        Self {
            provider: None,
            name: None,
            page_size: DEFAULT_PAGE_SIZE,
            sorts: Vec::new(),
            save_state: true,
            max_item_count: None,
            saved_state: None,
            _item: PhantomData,
        }
    }
}

impl<T, P> ReaderBuilder<T, P>
where
    T: Send + 'static,
    P: PageProvider<T>,
{
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page source (required)
    #[must_use]
    pub fn provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the reader identity
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Use an existing sort specification
    #[must_use]
    pub fn sort(mut self, sort: SortSpecification) -> Self {
        self.sorts = sort.orders().to_vec();
        self
    }

    /// Append `(field, direction)` sort keys
    #[must_use]
    pub fn sorts<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SortDirection)>,
        S: Into<String>,
    {
        self.sorts.extend(
            pairs
                .into_iter()
                .map(|(field, direction)| SortOrder::new(field, direction)),
        );
        self
    }

    /// Enable or disable state saving
    #[must_use]
    pub fn save_state(mut self, save_state: bool) -> Self {
        self.save_state = save_state;
        self
    }

    /// Stop after this many items
    #[must_use]
    pub fn max_item_count(mut self, max: u64) -> Self {
        self.max_item_count = Some(max);
        self
    }

    /// Continue from a saved state
    #[must_use]
    pub fn saved_state(mut self, state: Option<ReaderState>) -> Self {
        self.saved_state = state;
        self
    }

    /// Validate and build the reader
    pub fn build(self) -> Result<PaginatedReader<T, P>> {
        let provider = self
            .provider
            .ok_or_else(|| Error::config("A page provider is required"))?;
        let sort = SortSpecification::new(self.sorts)?;

        let mut config = ReaderConfig::new(sort)
            .with_page_size(self.page_size)
            .with_save_state(self.save_state);
        if let Some(name) = self.name {
            config = config.with_name(name);
        }
        if let Some(max) = self.max_item_count {
            config = config.with_max_item_count(max);
        }

        PaginatedReader::from_config(&config, provider, self.saved_state)
    }
}
