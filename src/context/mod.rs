//! Execution context module
//!
//! Durable key/value storage for reader state between runs.
//!
//! # Overview
//!
//! The context module provides:
//! - `ExecutionContext` - Flat map of keys to primitive JSON values
//! - `ContextStore` - File-based context persistence
//! - `execution_context_key` - `"<name>.<key>"` key derivation
//!
//! Readers never write to a store on their own; whoever drives them decides
//! when to checkpoint.

mod store;
mod types;

pub use store::ContextStore;
pub use types::{execution_context_key, ExecutionContext};
