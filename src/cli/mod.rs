//! CLI module
//!
//! Command-line interface for running reader jobs.
//!
//! # Commands
//!
//! - `read` - Read records, resuming from the saved state
//! - `state` - Show the saved reader state
//! - `reset` - Clear the saved reader state
//! - `validate` - Validate a job definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
