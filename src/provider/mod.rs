//! Page provider module
//!
//! Supports: in-memory JSON records, ordered vectors, DuckDB tables
//!
//! # Overview
//!
//! A `PageProvider` answers one question: "what are the items of page N,
//! with this page size, under this sort?". The reader owns all position
//! bookkeeping; providers are stateless with respect to it.
//!
//! Contract:
//! - Deterministic for a given request against an unchanged source
//! - Past the end of the data, return an empty `Page`, never an error
//! - Source failures are `Error::SourceUnavailable`

mod database;
mod memory;
mod types;

pub use database::DuckDbProvider;
pub use memory::{compare_json, MemoryProvider, VecProvider};
pub use types::{Page, PageProvider, PageRequest};
