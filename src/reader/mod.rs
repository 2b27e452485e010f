//! Paginated reader module
//!
//! Restartable, page-at-a-time item reader.
//!
//! # Overview
//!
//! The reader module provides:
//! - `PaginatedReader` - Serves items one by one from a single cached page
//! - `ReaderBuilder` - Fluent construction
//! - `ReaderState` - Snapshot of the reader position for persistence
//!
//! # Position bookkeeping
//!
//! ```text
//!   page_index ──► fetch_page(page_index, page_size, sort)
//!                        │
//!                  ┌─────┴──────────────┐
//!   cache:         │ i0 i1 [i2] i3 ...  │   offset_within_page = 2
//!                  └────────────────────┘
//!   after the last item of the page: page_index += 1, offset = 0, cache dropped
//! ```
//!
//! A restored reader fetches the saved page again and skips `offset` items.
//! A fetch that returns an empty page ends the stream without moving the
//! position, so a later read retries the same page.
//!
//! Paging is offset based. Records inserted before the current position shift
//! page contents and are not detected. Records appended while the last page
//! was short land in a page the reader has already moved past.
//!
//! A provider that returns more than `page_size` items has the page cut to
//! `page_size`, so a saved offset always stays inside the page. A read future
//! dropped during a fetch leaves the phase it found.

mod builder;
mod stream;
mod types;

pub use builder::ReaderBuilder;
pub use types::{
    default_reader_name, ReaderPhase, ReaderState, PAGE_INDEX_KEY, PAGE_OFFSET_KEY,
    PAGE_SIZE_KEY, READ_COUNT_KEY, SORT_SIGNATURE_KEY,
};

use crate::config::ReaderConfig;
use crate::context::{execution_context_key, ExecutionContext};
use crate::error::{Error, Result};
use crate::provider::{PageProvider, PageRequest};
use crate::sort::{SortSignature, SortSpecification};
use std::marker::PhantomData;

/// The page currently being served
struct CachedPage<T> {
    /// Items not yet handed out
    items: std::vec::IntoIter<T>,
    /// Length of the page as fetched
    len: usize,
}

/// Puts the previous phase back when dropped, unless disarmed
///
/// Covers both a failed fetch and a read future dropped mid-fetch.
struct PhaseGuard<'a> {
    phase: &'a mut ReaderPhase,
    previous: ReaderPhase,
    armed: bool,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a mut ReaderPhase, next: ReaderPhase) -> Self {
        let previous = std::mem::replace(phase, next);
        Self {
            phase,
            previous,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.phase = self.previous;
        }
    }
}

/// Restartable reader over a `PageProvider`
///
/// Not reentrant: every read takes `&mut self`. Use one reader (with its own
/// identity) per consumer.
pub struct PaginatedReader<T, P> {
    /// Identity used to namespace persisted state
    name: String,
    /// Items per page; fixed for the reader's lifetime
    page_size: u32,
    /// Ordering every page is requested under
    sort: SortSpecification,
    /// Signature of `sort`
    signature: SortSignature,
    /// Whether snapshots and restores are honored
    save_state: bool,
    /// Stop after this many items (counted across restarts)
    max_item_count: Option<u64>,
    /// Page source
    provider: P,
    /// Page the next item comes from
    page_index: u64,
    /// Index of the next unread item inside that page
    offset_within_page: u32,
    /// Items yielded so far
    total_items_read: u64,
    /// Single page cache
    cache: Option<CachedPage<T>>,
    /// Lifecycle phase
    phase: ReaderPhase,
    /// Set by the first `read_next` call
    started: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T, P> std::fmt::Debug for PaginatedReader<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedReader")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .field("sort", &self.sort.to_string())
            .field("page_index", &self.page_index)
            .field("offset_within_page", &self.offset_within_page)
            .field("total_items_read", &self.total_items_read)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<T, P> PaginatedReader<T, P>
where
    T: Send + 'static,
    P: PageProvider<T>,
{
    /// Open a reader, optionally continuing from a saved state
    ///
    /// Nothing is fetched until the first `read_next`.
    pub fn open(
        identity: impl Into<String>,
        page_size: u32,
        sort: SortSpecification,
        provider: P,
        saved: Option<ReaderState>,
    ) -> Result<Self> {
        let config = ReaderConfig::new(sort)
            .with_name(identity)
            .with_page_size(page_size);
        Self::from_config(&config, provider, saved)
    }

    /// Open a reader from a configuration
    pub fn from_config(
        config: &ReaderConfig,
        provider: P,
        saved: Option<ReaderState>,
    ) -> Result<Self> {
        config.validate()?;

        let name = config.resolved_name::<T>();
        let sort = config.sort.clone();
        let signature = sort.signature();

        tracing::info!(
            reader = %name,
            provider = provider.name(),
            page_size = config.page_size,
            sort = %sort,
            save_state = config.save_state,
            "Opened reader"
        );

        let mut reader = Self {
            name,
            page_size: config.page_size,
            sort,
            signature,
            save_state: config.save_state,
            max_item_count: config.max_item_count,
            provider,
            page_index: 0,
            offset_within_page: 0,
            total_items_read: 0,
            cache: None,
            phase: ReaderPhase::Ready,
            started: false,
            _item: PhantomData,
        };

        if let Some(state) = saved {
            reader.restore_from(state)?;
        }

        Ok(reader)
    }

    /// Open a reader and restore whatever the context holds for its identity
    pub fn open_with_context(
        config: &ReaderConfig,
        provider: P,
        context: &ExecutionContext,
    ) -> Result<Self> {
        let name = config.resolved_name::<T>();
        let saved = if config.save_state {
            ReaderState::read_from(&name, context)?
        } else {
            None
        };
        Self::from_config(config, provider, saved)
    }

    /// Read the next item
    ///
    /// `Ok(None)` means no item is currently available. Calling again retries
    /// the same page, which picks up data appended to the source since.
    /// A provider error is returned unchanged and leaves the position as it was.
    pub async fn read_next(&mut self) -> Result<Option<T>> {
        if self.phase == ReaderPhase::Closed {
            return Err(Error::invalid_transition(self.phase.as_str(), "read"));
        }
        self.started = true;

        if self
            .max_item_count
            .is_some_and(|max| self.total_items_read >= max)
        {
            tracing::debug!(reader = %self.name, "Reached max item count");
            self.phase = ReaderPhase::Exhausted;
            return Ok(None);
        }

        if self.cache_consumed() && !self.fetch_current_page().await? {
            return Ok(None);
        }

        let Some(cache) = self.cache.as_mut() else {
            return Ok(None);
        };
        let Some(item) = cache.items.next() else {
            self.cache = None;
            return Ok(None);
        };

        self.offset_within_page += 1;
        self.total_items_read += 1;
        self.phase = ReaderPhase::Serving;

        if self.offset_within_page as usize >= cache.len {
            self.page_index += 1;
            self.offset_within_page = 0;
            self.cache = None;
        }

        Ok(Some(item))
    }

    /// Fetch the page at the current index into the cache
    ///
    /// Returns `false` when there is nothing to serve from it.
    async fn fetch_current_page(&mut self) -> Result<bool> {
        self.cache = None;

        let request = PageRequest::new(self.page_index, self.page_size, &self.sort);
        let guard = PhaseGuard::enter(&mut self.phase, ReaderPhase::Fetching);
        let mut page = match self.provider.fetch_page(&request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    reader = %self.name,
                    page = self.page_index,
                    "Page fetch failed: {}", e
                );
                return Err(e);
            }
        };
        guard.disarm();

        let limit = request.limit();
        if page.len() > limit {
            tracing::warn!(
                reader = %self.name,
                page = self.page_index,
                items = page.len(),
                page_size = self.page_size,
                "Provider returned more items than requested; extra items dropped"
            );
            page.truncate(limit);
        }

        tracing::debug!(
            reader = %self.name,
            page = self.page_index,
            items = page.len(),
            last = page.is_last(),
            "Fetched page"
        );

        if page.is_empty() {
            self.phase = ReaderPhase::Exhausted;
            return Ok(false);
        }

        let len = page.len();
        let skip = self.offset_within_page as usize;
        if skip >= len {
            tracing::warn!(
                reader = %self.name,
                page = self.page_index,
                offset = skip,
                items = len,
                "Page is shorter than the saved offset; treating as end of stream"
            );
            self.phase = ReaderPhase::Exhausted;
            return Ok(false);
        }

        let mut items = page.into_items().into_iter();
        items.by_ref().take(skip).for_each(drop);
        self.cache = Some(CachedPage { items, len });
        Ok(true)
    }

    fn cache_consumed(&self) -> bool {
        self.cache
            .as_ref()
            .map_or(true, |cache| self.offset_within_page as usize >= cache.len)
    }
}

impl<T, P> PaginatedReader<T, P> {
    /// Current position, for external persistence
    ///
    /// With `save_state` disabled this is always the fresh state.
    pub fn snapshot(&self) -> ReaderState {
        let mut state = ReaderState::fresh(&self.name, self.page_size, self.signature.clone());
        if self.save_state {
            state.page_index = self.page_index;
            state.offset_within_page = self.offset_within_page;
            state.total_items_read = self.total_items_read;
        }
        state
    }

    /// Continue from a saved state
    ///
    /// Only allowed before the first `read_next`. A no-op when `save_state`
    /// is disabled.
    pub fn restore_from(&mut self, state: ReaderState) -> Result<()> {
        if self.phase == ReaderPhase::Closed {
            return Err(Error::invalid_transition(self.phase.as_str(), "restore"));
        }
        if self.started {
            return Err(Error::invalid_transition("streaming", "restore"));
        }
        if !self.save_state {
            tracing::debug!(reader = %self.name, "save_state disabled; ignoring saved state");
            return Ok(());
        }

        self.check_compatible(&state)?;

        tracing::info!(
            reader = %self.name,
            page = state.page_index,
            offset = state.offset_within_page,
            total = state.total_items_read,
            "Restored reader state"
        );

        self.page_index = state.page_index;
        self.offset_within_page = state.offset_within_page;
        self.total_items_read = state.total_items_read;
        self.cache = None;
        self.phase = ReaderPhase::Ready;
        Ok(())
    }

    /// Reject states produced under a different identity, page size or sort
    fn check_compatible(&self, state: &ReaderState) -> Result<()> {
        if state.identity != self.name {
            return Err(Error::config(format!(
                "Saved state belongs to reader '{}', not '{}'",
                state.identity, self.name
            )));
        }
        if state.page_size != self.page_size {
            return Err(Error::config(format!(
                "Saved state for '{}' was produced with page size {}, reader uses {}",
                self.name, state.page_size, self.page_size
            )));
        }
        if state.sort_signature != self.signature {
            return Err(Error::config(format!(
                "Saved state for '{}' was produced under a different sort (signature {}, reader has {})",
                self.name, state.sort_signature, self.signature
            )));
        }
        if state.offset_within_page >= self.page_size {
            return Err(Error::config(format!(
                "Saved offset {} is not inside a page of size {}",
                state.offset_within_page, self.page_size
            )));
        }
        if state.total_items_read > state.max_accounted_items() {
            return Err(Error::config(format!(
                "Saved item count {} exceeds what page {} offset {} can account for",
                state.total_items_read, state.page_index, state.offset_within_page
            )));
        }
        Ok(())
    }

    /// Write the current position into an execution context
    ///
    /// A no-op when `save_state` is disabled.
    pub fn update(&self, context: &mut ExecutionContext) {
        if self.save_state {
            self.snapshot().write_to(context);
        }
    }

    /// Release the cached page; idempotent
    pub fn close(&mut self) {
        if self.phase != ReaderPhase::Closed {
            tracing::info!(
                reader = %self.name,
                total = self.total_items_read,
                "Closed reader"
            );
        }
        self.cache = None;
        self.phase = ReaderPhase::Closed;
    }

    /// Full persistence key for `key` under this reader's identity
    pub fn execution_context_key(&self, key: &str) -> String {
        execution_context_key(&self.name, key)
    }

    /// Reader identity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Items per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sort specification
    pub fn sort(&self) -> &SortSpecification {
        &self.sort
    }

    /// Whether state is saved/restored
    pub fn save_state(&self) -> bool {
        self.save_state
    }

    /// Lifecycle phase
    pub fn phase(&self) -> ReaderPhase {
        self.phase
    }

    /// Check if the reader was closed
    pub fn is_closed(&self) -> bool {
        self.phase == ReaderPhase::Closed
    }

    /// Items yielded so far (including those before a restore)
    pub fn items_read(&self) -> u64 {
        self.total_items_read
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }
}
