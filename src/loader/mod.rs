//! YAML Loader module
//!
//! Parse job definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `JobDefinition` - Reader configuration plus the source it reads
//! - `SourceDefinition` - DuckDB table or JSON file
//! - YAML parsing with validation
//!
//! ```yaml
//! name: users
//! reader:
//!   page_size: 100
//!   sort:
//!     id: asc
//! source:
//!   type: duckdb
//!   database: warehouse.duckdb
//!   table: users
//! ```

mod parser;
mod types;

pub use parser::{load_job, load_job_from_str, open_source};
pub use types::{JobDefinition, SourceDefinition, IN_MEMORY_DATABASE};
