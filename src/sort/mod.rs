//! Sort specification module
//!
//! Deterministic ordering for paged reads.
//!
//! # Overview
//!
//! Page boundaries are only stable under a total order, so every reader
//! carries a non-empty `SortSpecification`. The module provides:
//! - `SortDirection` / `SortOrder` - One `(field, direction)` pair
//! - `SortSpecification` - Validated, immutable, ordered list of pairs
//! - `SortSignature` - Checksum used to detect incompatible restores

mod signature;
mod types;

pub use signature::SortSignature;
pub use types::{is_valid_field_name, SortDirection, SortOrder, SortSpecification};

#[cfg(test)]
mod tests;
