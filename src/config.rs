//! Configuration types for readers
//!
//! This module contains the reader configuration surface. A `ReaderConfig` is
//! usually embedded in a job definition (see `loader`) but can be built in code.

use crate::error::{Error, Result};
use crate::reader::default_reader_name;
use crate::sort::SortSpecification;
use serde::{Deserialize, Serialize};

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ============================================================================
// Reader Config
// ============================================================================

/// Reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Identity used to namespace persisted state
    ///
    /// Defaults to a name derived from the item type (`ValueReader` for JSON
    /// records). Give each reader of the same item type its own name.
    #[serde(default)]
    pub name: Option<String>,

    /// Items per page; must match between runs sharing saved state
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Deterministic ordering (required, non-empty)
    pub sort: SortSpecification,

    /// Whether position is snapshotted and restored
    #[serde(default = "default_save_state")]
    pub save_state: bool,

    /// Stop after this many items in total
    #[serde(default)]
    pub max_item_count: Option<u64>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_save_state() -> bool {
    true
}

impl ReaderConfig {
    /// Create a config with default settings for the given sort
    pub fn new(sort: SortSpecification) -> Self {
        Self {
            name: None,
            page_size: DEFAULT_PAGE_SIZE,
            sort,
            save_state: true,
            max_item_count: None,
        }
    }

    /// Set the reader identity
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enable or disable state saving
    #[must_use]
    pub fn with_save_state(mut self, save_state: bool) -> Self {
        self.save_state = save_state;
        self
    }

    /// Set the maximum number of items to read
    #[must_use]
    pub fn with_max_item_count(mut self, max: u64) -> Self {
        self.max_item_count = Some(max);
        self
    }

    /// Check the configuration for errors
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }

        if self.sort.is_empty() {
            return Err(Error::invalid_value("sort", "cannot be empty"));
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::invalid_value("name", "cannot be blank"));
            }
        }

        Ok(())
    }

    /// Configured name, or the default for readers of `T`
    pub fn resolved_name<T: ?Sized>(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(default_reader_name::<T>)
    }
}
