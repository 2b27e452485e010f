//! Loader types
//!
//! Declarative job definition types for YAML parsing.

use crate::config::ReaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Job Definition
// ============================================================================

/// Top-level job definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobDefinition {
    /// Job name; also the reader identity when the reader has no name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Reader configuration
    pub reader: ReaderConfig,
    /// Where records come from
    pub source: SourceDefinition,
}

impl JobDefinition {
    /// Reader configuration with the identity defaulted to the job name
    pub fn reader_config(&self) -> ReaderConfig {
        let mut config = self.reader.clone();
        if config.name.is_none() {
            config.name = Some(self.name.clone());
        }
        config
    }

    /// Identity the job's reader persists its state under
    pub fn reader_name(&self) -> String {
        self.reader
            .name
            .clone()
            .unwrap_or_else(|| self.name.clone())
    }

    /// Resolve relative source paths against `base`
    pub(crate) fn resolve_paths(&mut self, base: &Path) {
        match &mut self.source {
            SourceDefinition::Duckdb { database, .. } => {
                if database.as_str() != IN_MEMORY_DATABASE
                    && Path::new(database.as_str()).is_relative()
                {
                    *database = base.join(&*database).to_string_lossy().into_owned();
                }
            }
            SourceDefinition::JsonFile { path } => {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

// ============================================================================
// Source Definition
// ============================================================================

/// DuckDB database name for an in-memory database
pub const IN_MEMORY_DATABASE: &str = ":memory:";

fn default_database() -> String {
    IN_MEMORY_DATABASE.to_string()
}

/// Record source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDefinition {
    /// Table read through DuckDB
    Duckdb {
        /// Database file, or `:memory:`
        #[serde(default = "default_database")]
        database: String,
        /// Table to read (optionally schema qualified)
        table: String,
        /// SQL run once when the connection is opened
        #[serde(default)]
        setup: Option<String>,
    },
    /// JSON array or JSON Lines file loaded into memory
    JsonFile {
        /// File path
        path: PathBuf,
    },
}

impl SourceDefinition {
    /// Short name of the source type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Duckdb { .. } => "duckdb",
            Self::JsonFile { .. } => "json_file",
        }
    }
}
