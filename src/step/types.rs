//! Step types
//!
//! Configuration and statistics for driving a reader.

use crate::error::{Error, Result};

/// Items between checkpoints when none is configured
pub const DEFAULT_COMMIT_INTERVAL: u64 = 10;

/// Configuration for a read step
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Items handled between two checkpoints
    pub commit_interval: u64,
    /// Stop after this many items in this run (None = until end of stream)
    pub limit: Option<u64>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            commit_interval: DEFAULT_COMMIT_INTERVAL,
            limit: None,
        }
    }
}

impl StepConfig {
    /// Create a new step config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set commit interval
    #[must_use]
    pub fn with_commit_interval(mut self, interval: u64) -> Self {
        self.commit_interval = interval;
        self
    }

    /// Set per-run item limit
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.commit_interval == 0 {
            return Err(Error::invalid_value(
                "commit_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Statistics from a read step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Items handed to the item handler
    pub items_read: u64,
    /// Checkpoints written to the store
    pub checkpoints: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl StepStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one handled item
    pub fn add_item(&mut self) {
        self.items_read += 1;
    }

    /// Count one checkpoint
    pub fn add_checkpoint(&mut self) {
        self.checkpoints += 1;
    }
}
