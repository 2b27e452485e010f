//! YAML parser for job definitions
//!
//! Parses and validates job YAML files and opens the source they describe.

use crate::error::{Error, Result};
use crate::loader::types::{JobDefinition, SourceDefinition};
use crate::provider::{DuckDbProvider, MemoryProvider, PageProvider};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a job definition from a file path
///
/// Relative source paths are resolved against the directory of the job file.
pub fn load_job(path: impl AsRef<Path>) -> Result<JobDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read job file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;

    let mut def = load_job_from_str(&content)?;
    if let Some(base) = path.parent() {
        def.resolve_paths(base);
    }
    Ok(def)
}

/// Load a job definition from a YAML string
pub fn load_job_from_str(yaml: &str) -> Result<JobDefinition> {
    let def: JobDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse job YAML: {e}")))?;

    validate_job(&def)?;
    Ok(def)
}

/// Validate a job definition
fn validate_job(def: &JobDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Job name cannot be empty"));
    }

    def.reader_config().validate()?;

    match &def.source {
        SourceDefinition::Duckdb { database, table, .. } => {
            if database.trim().is_empty() {
                return Err(Error::invalid_value("source.database", "cannot be empty"));
            }
            if table.trim().is_empty() {
                return Err(Error::invalid_value("source.table", "cannot be empty"));
            }
        }
        SourceDefinition::JsonFile { path } => {
            if path.as_os_str().is_empty() {
                return Err(Error::invalid_value("source.path", "cannot be empty"));
            }
        }
    }

    Ok(())
}

/// Open the page provider a source definition describes
pub fn open_source(
    name: &str,
    source: &SourceDefinition,
) -> Result<Box<dyn PageProvider<Value>>> {
    tracing::debug!(job = name, source = source.kind(), "Opening source");

    match source {
        SourceDefinition::Duckdb {
            database,
            table,
            setup,
        } => {
            let provider = DuckDbProvider::open(database, table.as_str())?.with_name(name);
            if let Some(sql) = setup {
                provider.execute_batch(sql)?;
            }
            Ok(Box::new(provider))
        }
        SourceDefinition::JsonFile { path } => {
            let content = fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    Error::source_unavailable(
                        name,
                        format!("Failed to read '{}': {e}", path.display()),
                    )
                }
            })?;
            Ok(Box::new(MemoryProvider::from_json_str(name, &content)?))
        }
    }
}
