//! Reader state types
//!
//! `ReaderState` is the only thing that crosses the restart boundary. It is
//! written into an `ExecutionContext` as flat `"<identity>.reader.<field>"`
//! entries and read back from there.

use crate::context::{execution_context_key, ExecutionContext};
use crate::error::{Error, Result};
use crate::sort::SortSignature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key suffix for the current page index
pub const PAGE_INDEX_KEY: &str = "reader.page.index";
/// Key suffix for the offset within the current page
pub const PAGE_OFFSET_KEY: &str = "reader.page.offset";
/// Key suffix for the total number of items read
pub const READ_COUNT_KEY: &str = "reader.read.count";
/// Key suffix for the page size the state was produced with
pub const PAGE_SIZE_KEY: &str = "reader.page.size";
/// Key suffix for the sort signature the state was produced with
pub const SORT_SIGNATURE_KEY: &str = "reader.sort.signature";

/// Position of a reader, suitable for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderState {
    /// Identity used to namespace persisted keys
    pub identity: String,
    /// Page the next item comes from
    pub page_index: u64,
    /// Index of the next unread item inside that page
    pub offset_within_page: u32,
    /// Items yielded so far
    pub total_items_read: u64,
    /// Page size in effect when the state was taken
    pub page_size: u32,
    /// Sort signature in effect when the state was taken
    pub sort_signature: SortSignature,
}

impl ReaderState {
    /// State of a reader that has not read anything
    pub fn fresh(identity: impl Into<String>, page_size: u32, sort_signature: SortSignature) -> Self {
        Self {
            identity: identity.into(),
            page_index: 0,
            offset_within_page: 0,
            total_items_read: 0,
            page_size,
            sort_signature,
        }
    }

    /// Check if this state is at the very start of the stream
    pub fn is_fresh(&self) -> bool {
        self.page_index == 0 && self.offset_within_page == 0 && self.total_items_read == 0
    }

    /// Largest item count the position can account for
    ///
    /// Equal to `total_items_read` while every page served so far was full.
    pub fn max_accounted_items(&self) -> u64 {
        self.page_index
            .saturating_mul(u64::from(self.page_size))
            .saturating_add(u64::from(self.offset_within_page))
    }

    /// Write this state into an execution context
    pub fn write_to(&self, context: &mut ExecutionContext) {
        let key = |suffix| execution_context_key(&self.identity, suffix);
        context.put(key(PAGE_INDEX_KEY), self.page_index);
        context.put(key(PAGE_OFFSET_KEY), self.offset_within_page);
        context.put(key(READ_COUNT_KEY), self.total_items_read);
        context.put(key(PAGE_SIZE_KEY), self.page_size);
        context.put(key(SORT_SIGNATURE_KEY), self.sort_signature.as_str());
    }

    /// Read the state saved for `identity`, if any
    ///
    /// Returns `Ok(None)` when no key for the identity is present and an error
    /// when only some of them are.
    pub fn read_from(identity: &str, context: &ExecutionContext) -> Result<Option<Self>> {
        let key = |suffix| execution_context_key(identity, suffix);

        let page_index = context.get_u64(&key(PAGE_INDEX_KEY))?;
        let offset = context.get_u64(&key(PAGE_OFFSET_KEY))?;
        let total = context.get_u64(&key(READ_COUNT_KEY))?;
        let page_size = context.get_u64(&key(PAGE_SIZE_KEY))?;
        let signature = context.get_str(&key(SORT_SIGNATURE_KEY))?;

        match (page_index, offset, total, page_size, signature) {
            (None, None, None, None, None) => Ok(None),
            (Some(page_index), Some(offset), Some(total), Some(page_size), Some(signature)) => {
                Ok(Some(Self {
                    identity: identity.to_string(),
                    page_index,
                    offset_within_page: narrow(identity, PAGE_OFFSET_KEY, offset)?,
                    total_items_read: total,
                    page_size: narrow(identity, PAGE_SIZE_KEY, page_size)?,
                    sort_signature: SortSignature::from_persisted(signature),
                }))
            }
            _ => Err(Error::state(format!(
                "Incomplete saved state for reader '{identity}'"
            ))),
        }
    }

    /// Remove every key saved for `identity`
    pub fn clear_from(identity: &str, context: &mut ExecutionContext) {
        for suffix in [
            PAGE_INDEX_KEY,
            PAGE_OFFSET_KEY,
            READ_COUNT_KEY,
            PAGE_SIZE_KEY,
            SORT_SIGNATURE_KEY,
        ] {
            context.remove(&execution_context_key(identity, suffix));
        }
    }
}

fn narrow(identity: &str, suffix: &str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::state(format!(
            "Saved value {value} for '{}' is out of range",
            execution_context_key(identity, suffix)
        ))
    })
}

/// Lifecycle phase of a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    /// Opened, nothing read yet
    Ready,
    /// A page fetch is in flight
    Fetching,
    /// Items are being served from the cached page
    Serving,
    /// The last fetch returned no items; the next read fetches again
    Exhausted,
    /// Closed; no further reads
    Closed,
}

impl ReaderPhase {
    /// Lowercase name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Fetching => "fetching",
            Self::Serving => "serving",
            Self::Exhausted => "exhausted",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ReaderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default identity for readers of `T`: the short type name plus `Reader`
///
/// `serde_json::Value` gives `ValueReader`, `Vec<u8>` gives `VecReader`.
pub fn default_reader_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    format!("{short}Reader")
}
