//! Context store implementation
//!
//! Provides file-based execution context persistence with atomic writes.

use super::types::ExecutionContext;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// On-disk layout of a context file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredContext {
    /// Time of the last save
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    /// Saved entries
    #[serde(default)]
    context: ExecutionContext,
}

/// Store for persisting and loading execution contexts
#[derive(Debug)]
pub struct ContextStore {
    /// Path to the context file
    path: PathBuf,
    /// Current contents (cached)
    stored: Arc<RwLock<StoredContext>>,
    /// Whether to auto-save on every update
    auto_save: bool,
}

impl ContextStore {
    /// Create a new store with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            stored: Arc::new(RwLock::new(StoredContext::default())),
            auto_save: true,
        }
    }

    /// Create a store with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            stored: Arc::new(RwLock::new(StoredContext::default())),
            auto_save: false,
        }
    }

    /// Create a store from a file, loading existing contents if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stored = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read context file: {e}"),
            })?;
            parse_stored(&contents)?
        } else {
            StoredContext::default()
        };

        Ok(Self {
            path,
            stored: Arc::new(RwLock::new(stored)),
            auto_save: true,
        })
    }

    /// Create an in-memory store from an inline JSON string
    ///
    /// Accepts either the file layout or a bare `{key: value}` map.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored = parse_stored(json)?;

        Ok(Self {
            path: PathBuf::new(),
            stored: Arc::new(RwLock::new(stored)),
            auto_save: false,
        })
    }

    /// Load contents from file
    pub async fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to read context file: {e}"),
            })?;

        let loaded = parse_stored(&contents)?;

        let mut stored = self.stored.write().await;
        *stored = loaded;

        Ok(())
    }

    /// Save current contents to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.write_file(&self.path).await
    }

    /// Save current contents to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_file(path.as_ref()).await
    }

    async fn write_file(&self, path: &Path) -> Result<()> {
        let contents = {
            let mut stored = self.stored.write().await;
            stored.updated_at = Some(Utc::now());
            serde_json::to_string_pretty(&*stored)
                .map_err(|e| Error::checkpoint(format!("Failed to serialize context: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to write context file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to rename context file: {e}")))?;

        tracing::debug!(path = %path.display(), "Saved execution context");
        Ok(())
    }

    /// Copy of the current context
    pub async fn context(&self) -> ExecutionContext {
        self.stored.read().await.context.clone()
    }

    /// Time of the last save, if any
    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.stored.read().await.updated_at
    }

    /// Merge entries into the stored context
    pub async fn put_all(&self, context: &ExecutionContext) -> Result<()> {
        {
            let mut stored = self.stored.write().await;
            stored.context.merge(context);
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Remove every entry under `"<name>."`
    pub async fn clear_namespace(&self, name: &str) -> Result<usize> {
        let removed = {
            let mut stored = self.stored.write().await;
            stored.context.remove_namespace(name)
        };

        if self.auto_save {
            self.save().await?;
        }

        Ok(removed)
    }

    /// Clear all entries
    pub async fn clear(&self) -> Result<()> {
        {
            let mut stored = self.stored.write().await;
            stored.context = ExecutionContext::new();
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Export the context as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let stored = self.stored.read().await;
        serde_json::to_string(&stored.context).map_err(|e| Error::State {
            message: format!("Failed to serialize context: {e}"),
        })
    }

    /// Export the context as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let stored = self.stored.read().await;
        serde_json::to_string_pretty(&stored.context).map_err(|e| Error::State {
            message: format!("Failed to serialize context: {e}"),
        })
    }

    /// Get the context file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Check if every update is written through to disk
    pub fn is_auto_save(&self) -> bool {
        self.auto_save
    }

    /// Create a checkpoint (alias for save)
    pub async fn checkpoint(&self) -> Result<()> {
        self.save().await
    }
}

impl Clone for ContextStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            stored: Arc::clone(&self.stored),
            auto_save: self.auto_save,
        }
    }
}

/// Parse either the file layout or a bare context map
fn parse_stored(contents: &str) -> Result<StoredContext> {
    let value: serde_json::Value = serde_json::from_str(contents).map_err(|e| Error::State {
        message: format!("Failed to parse context JSON: {e}"),
    })?;

    let is_file_layout = value
        .as_object()
        .is_some_and(|map| map.contains_key("context"));

    if is_file_layout {
        serde_json::from_value(value).map_err(|e| Error::State {
            message: format!("Failed to parse context file: {e}"),
        })
    } else {
        let context = serde_json::from_value(value).map_err(|e| Error::State {
            message: format!("Failed to parse context map: {e}"),
        })?;
        Ok(StoredContext {
            updated_at: None,
            context,
        })
    }
}
