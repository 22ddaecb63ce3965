//! Cache backend implementations.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod inmemory;

pub use inmemory::{CacheStats, InMemoryBackend};

/// Eviction hint attached to each entry.
///
/// Only consulted when a bounded backend must make room; it never extends
/// an entry past its TTL and never guarantees survival under pressure.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CachePriority {
    Low,
    #[default]
    Normal,
    High,
    /// Never chosen for capacity eviction. Still expires and is still
    /// removed by invalidation.
    NeverRemove,
}

/// Per-entry storage options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Absolute time-to-live from the moment of the write. `None` = no expiry.
    pub ttl: Option<Duration>,
    pub priority: CachePriority,
}

impl EntryOptions {
    pub fn new(ttl: Option<Duration>, priority: CachePriority) -> Self {
        EntryOptions { ttl, priority }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Trait for cache backend implementations.
///
/// Stores encoded pages by key. All methods use `&self` so a backend can be
/// shared across concurrent requests; implementations use interior
/// mutability.
///
/// **Expiry is authoritative:** `get` must never return an entry whose TTL
/// has elapsed, whatever its priority.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Live entry found
    /// - `Ok(None)` - Absent or expired
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value, replacing any previous entry under `key` wholesale.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>, options: EntryOptions) -> Result<()>;

    /// Remove one entry. Returns whether an entry was present.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete_prefix(&self, prefix: &str) -> Result<usize>;

    /// Check if a live entry exists (optional optimization).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn clear_all(&self) -> Result<()>;
}
