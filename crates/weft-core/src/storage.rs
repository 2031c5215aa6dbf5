//! Storage handle contract and construction seams.
//!
//! The cache never performs storage I/O itself; it hands out [`ObjectStore`]
//! handles built by an externally supplied [`StoreFactory`] from a config
//! snapshot. Concrete cloud backends live outside this crate; [`MemoryStore`]
//! exists so the cache and the embedding application can be exercised without
//! one.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// A ready-to-use storage access handle scoped to one credential grant.
///
/// Handles are shared via `Arc` between the cache and every caller that
/// acquired them; expiry stops the cache returning a handle for new lookups
/// but never revokes outstanding clones.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads an entire object.
    ///
    /// Returns [`Error::Storage`] if the object does not exist.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes an object, replacing any existing content.
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Deletes an object. Succeeds even if the object does not exist.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists object paths with the given prefix, in arbitrary order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Builds storage handles from config snapshots.
///
/// This is the `CreateResourceHandle` collaborator: implementations wrap a
/// concrete cloud SDK and fail with an implementation-defined
/// [`Error::Storage`] when a snapshot is invalid.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Constructs a new handle from a credential-bearing config snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the snapshot is invalid or the backend
    /// client cannot be constructed.
    async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn ObjectStore>>;
}

/// In-memory storage handle for testing and local development.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        objects
            .get(path)
            .cloned()
            .ok_or_else(|| Error::storage(format!("object not found: {path}")))
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
