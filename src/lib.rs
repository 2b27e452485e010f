// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Reader
//!
//! A restartable, paginated item reader for ordered, page-addressable sources.
//!
//! ## Features
//!
//! - **Page-at-a-time reads**: One page cached at a time, items served one by one
//! - **Restartable**: Position snapshots written to an execution context and restored on restart
//! - **Deterministic ordering**: Every page requested under an explicit sort specification
//! - **Tailing**: An exhausted reader picks up records appended to the source later
//! - **Sources**: In-memory JSON records, ordered vectors, DuckDB tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_reader::{MemoryProvider, PaginatedReader, SortSpecification, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let provider = MemoryProvider::from_json_str("users", r#"[{"id": 2}, {"id": 1}]"#)?;
//!     let sort = SortSpecification::ascending("id")?;
//!
//!     let mut reader = PaginatedReader::open("users-reader", 100, sort, provider, None)?;
//!     while let Some(user) = reader.read_next().await? {
//!         println!("{user}");
//!     }
//!
//!     // Persist `reader.snapshot()` and hand it back to `open` on the next run
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PaginatedReader                          │
//! │  read_next() → Option<T>   snapshot() → ReaderState             │
//! │  restore_from(state)       update(context)      close()         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬─────────────┬────────────┐
//! │   Provider   │        Sort           │   Context   │    Step    │
//! ├──────────────┼───────────────────────┼─────────────┼────────────┤
//! │ Memory       │ Field validation      │ Key/value   │ Commit     │
//! │ Vec          │ Multi-key ordering    │ File store  │ interval   │
//! │ DuckDB       │ Signature (SHA-256)   │ Atomic save │ Limit      │
//! └──────────────┴───────────────────────┴─────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the reader
pub mod error;

/// Sort specifications and signatures
pub mod sort;

/// Page providers (memory, vector, DuckDB)
pub mod provider;

/// The paginated reader
pub mod reader;

/// Execution context and its file store
pub mod context;

/// Reader configuration
pub mod config;

/// YAML loader for job definitions
pub mod loader;

/// Checkpointing read step
pub mod step;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

// Re-export commonly used types
pub use config::ReaderConfig;
pub use context::{execution_context_key, ContextStore, ExecutionContext};
pub use loader::{load_job, load_job_from_str, JobDefinition, SourceDefinition};
pub use provider::{DuckDbProvider, MemoryProvider, Page, PageProvider, PageRequest, VecProvider};
pub use reader::{PaginatedReader, ReaderBuilder, ReaderPhase, ReaderState};
pub use sort::{SortDirection, SortOrder, SortSignature, SortSpecification};
pub use step::{ReadStep, StepConfig, StepStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
