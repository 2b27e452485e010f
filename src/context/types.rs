//! Execution context types
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Derive a namespaced context key: `"<name>.<key>"`
pub fn execution_context_key(name: &str, key: &str) -> String {
    format!("{name}.{key}")
}

/// Flat map of keys to primitive values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get an unsigned integer value
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                Error::state(format!(
                    "Context key '{key}' holds {value}, expected a non-negative integer"
                ))
            }),
        }
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or_else(|| {
                Error::state(format!("Context key '{key}' holds {value}, expected a string"))
            }),
        }
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Remove every key under `"<name>."`
    pub fn remove_namespace(&mut self, name: &str) -> usize {
        let prefix = format!("{name}.");
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        before - self.entries.len()
    }

    /// Copy every entry of `other` into this context
    pub fn merge(&mut self, other: &ExecutionContext) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Iterate over keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the context has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_context_key() {
        assert_eq!(
            execution_context_key("reader-1", "reader.page.index"),
            "reader-1.reader.page.index"
        );
    }

    #[test]
    fn test_typed_getters() {
        let mut context = ExecutionContext::new();
        context.put("a.count", 3u64);
        context.put("a.name", "users");

        assert_eq!(context.get_u64("a.count").unwrap(), Some(3));
        assert_eq!(context.get_str("a.name").unwrap(), Some("users"));
        assert_eq!(context.get_u64("a.missing").unwrap(), None);
    }

    #[test]
    fn test_typed_getter_mismatch() {
        let mut context = ExecutionContext::new();
        context.put("a.count", "three");
        context.put("a.negative", -1);

        assert!(context.get_u64("a.count").is_err());
        assert!(context.get_u64("a.negative").is_err());
        assert!(context.get_str("a.negative").is_err());
    }

    #[test]
    fn test_namespaces() {
        let mut context = ExecutionContext::new();
        context.put("one.reader.page.index", 1);
        context.put("one.reader.read.count", 2);
        context.put("onetwo.reader.page.index", 3);
        context.put("two.reader.page.index", 4);

        assert_eq!(context.remove_namespace("one"), 2);
        let keys: Vec<_> = context.keys().collect();
        assert_eq!(keys, vec!["onetwo.reader.page.index", "two.reader.page.index"]);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = ExecutionContext::new();
        base.put("a.x", 1);
        base.put("a.y", 1);

        let mut update = ExecutionContext::new();
        update.put("a.x", 2);

        base.merge(&update);
        assert_eq!(base.get_u64("a.x").unwrap(), Some(2));
        assert_eq!(base.get_u64("a.y").unwrap(), Some(1));
    }

    #[test]
    fn test_serialization_is_flat() {
        let mut context = ExecutionContext::new();
        context.put("r.reader.page.index", 2);

        let json = serde_json::to_string(&context).unwrap();
        assert_eq!(json, r#"{"r.reader.page.index":2}"#);

        let restored: ExecutionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, context);
    }
}
