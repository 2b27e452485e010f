//! Read step module
//!
//! Drives a reader and checkpoints its position.
//!
//! # Overview
//!
//! The step module provides:
//! - `ReadStep` - Reads until end of stream (or a limit), checkpointing as it goes
//! - `StepConfig` - Commit interval and limit
//! - `StepStats` - What a run did
//!
//! A checkpoint writes `reader.update()` into a `ContextStore` and saves it.
//! One happens every `commit_interval` handled items and one at the end of
//! the run. When the source fails the last consistent position is
//! checkpointed before the error is returned; when the item handler fails
//! nothing is checkpointed, so the failed item is read again on restart.

mod types;

pub use types::{StepConfig, StepStats, DEFAULT_COMMIT_INTERVAL};

use crate::context::{ContextStore, ExecutionContext};
use crate::error::Result;
use crate::provider::PageProvider;
use crate::reader::PaginatedReader;
use std::time::Instant;

/// Step that drives one reader
#[derive(Debug, Clone, Default)]
pub struct ReadStep {
    /// Step configuration
    config: StepConfig,
    /// Statistics of the last run
    stats: StepStats,
}

impl ReadStep {
    /// Create a step with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set step configuration
    #[must_use]
    pub fn with_config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the step configuration
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Get statistics of the last run
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// Read items, hand each to `on_item`, and checkpoint into `store`
    ///
    /// Source errors are not retried.
    pub async fn run<T, P, F>(
        &mut self,
        reader: &mut PaginatedReader<T, P>,
        store: &ContextStore,
        mut on_item: F,
    ) -> Result<StepStats>
    where
        T: Send + 'static,
        P: PageProvider<T>,
        F: FnMut(T) -> Result<()>,
    {
        self.config.validate()?;

        let start = Instant::now();
        self.stats = StepStats::new();
        let mut uncommitted = 0u64;

        tracing::info!(
            reader = reader.name(),
            commit_interval = self.config.commit_interval,
            limit = ?self.config.limit,
            "Starting read step"
        );

        loop {
            if self
                .config
                .limit
                .is_some_and(|limit| self.stats.items_read >= limit)
            {
                tracing::debug!(reader = reader.name(), "Reached step limit");
                break;
            }

            let item = match reader.read_next().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    if uncommitted > 0 {
                        self.checkpoint(reader, store).await?;
                    }
                    self.stats.duration_ms = elapsed_ms(start);
                    return Err(e);
                }
            };

            on_item(item)?;
            self.stats.add_item();
            uncommitted += 1;

            if uncommitted >= self.config.commit_interval {
                self.checkpoint(reader, store).await?;
                uncommitted = 0;
            }
        }

        if uncommitted > 0 || self.stats.checkpoints == 0 {
            self.checkpoint(reader, store).await?;
        }

        self.stats.duration_ms = elapsed_ms(start);

        tracing::info!(
            reader = reader.name(),
            items = self.stats.items_read,
            checkpoints = self.stats.checkpoints,
            duration_ms = self.stats.duration_ms,
            "Finished read step"
        );

        Ok(self.stats.clone())
    }

    async fn checkpoint<T, P>(
        &mut self,
        reader: &PaginatedReader<T, P>,
        store: &ContextStore,
    ) -> Result<()> {
        let mut context = ExecutionContext::new();
        reader.update(&mut context);
        store.put_all(&context).await?;
        if !store.is_auto_save() {
            store.checkpoint().await?;
        }
        self.stats.add_checkpoint();

        tracing::debug!(
            reader = reader.name(),
            total = reader.items_read(),
            "Checkpointed reader state"
        );
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
