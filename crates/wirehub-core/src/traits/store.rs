//! Key-value persistence delegate contract.
//!
//! The transport crates treat persistence as an external collaborator:
//! typed get/set by key with a caller-supplied default. [`MemoryStore`] is
//! the in-process reference implementation.

use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::result::NetResult;

/// Trait for key-value persistence backends.
///
/// All values are stored as strings; typed access goes through the JSON
/// helpers.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> NetResult<Option<String>>;

    /// Get a value by key, falling back to `default` when absent.
    async fn get_or(&self, key: &str, default: &str) -> NetResult<String> {
        Ok(self
            .get(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Set a value for a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> NetResult<()>;

    /// Remove a key. No-op if absent.
    async fn remove(&self, key: &str) -> NetResult<()>;

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> NetResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Sync>(&self, key: &str, value: &T) -> NetResult<()>
    where
        Self: Sized,
    {
        let encoded = serde_json::to_string(value)?;
        self.set(key, &encoded).await
    }
}

/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> NetResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> NetResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> NetResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
