//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding: reads take a
//! shard read lock, inserts and deletes take the shard write lock for one
//! key, and a prefix sweep write-locks each shard in turn.
//! Expired entries are dropped on access.

use super::{CacheBackend, CachePriority, EntryOptions};
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    created_at: Instant,
    expires_at: Option<Instant>,
    priority: CachePriority,
}

impl CacheEntry {
    fn new(data: Vec<u8>, options: EntryOptions) -> Self {
        let created_at = Instant::now();
        CacheEntry {
            data,
            created_at,
            // A TTL past the clock's range never expires.
            expires_at: options.ttl.and_then(|d| created_at.checked_add(d)),
            priority: options.priority,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Unbounded by default. With [`InMemoryBackend::with_capacity`], an insert
/// that would exceed the capacity first drops expired entries, then evicts
/// the lowest-priority, oldest entry. Capacity eviction is best-effort:
/// when every entry is `NeverRemove` the backend grows past its capacity.
///
/// # Example
///
/// ```no_run
/// use library_cache::backend::{CacheBackend, EntryOptions, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     let options = EntryOptions::default().with_ttl(Duration::from_secs(600));
///     backend.set("books_cache_1_5", b"page".to_vec(), options).await?;
///
///     let value = backend.get("books_cache_1_5").await?;
///     assert!(value.is_some());
///
///     backend.delete_prefix("books_cache_").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
    capacity: Option<usize>,
}

impl InMemoryBackend {
    /// Create an unbounded in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            capacity: None,
        }
    }

    /// Create a backend that evicts by priority once `capacity` entries are held.
    pub fn with_capacity(capacity: usize) -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::with_capacity(capacity)),
            capacity: Some(capacity.max(1)),
        }
    }

    /// Get the current number of entries in cache, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remaining TTL of a live entry.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entry = self.store.get(key)?;
        if entry.is_expired() {
            return None;
        }
        entry
            .expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();
        let expired_count = self.store.iter().filter(|entry| entry.is_expired()).count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries: expired_count,
            total_bytes,
        }
    }

    /// Print cache statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Cache Stats: {} entries ({} expired), {} bytes",
            stats.total_entries, stats.expired_entries, stats.total_bytes
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.store.len())
    }

    fn make_room(&self, incoming: &str, capacity: usize) {
        if self.store.len() < capacity || self.store.contains_key(incoming) {
            return;
        }

        let purged = self.purge_expired();
        if purged > 0 {
            debug!("✓ InMemory purged {} expired entries", purged);
        }

        while self.store.len() >= capacity {
            // Collect the victim first: removing while iterating would
            // deadlock on the shard lock.
            let victim = self
                .store
                .iter()
                .filter(|e| e.priority != CachePriority::NeverRemove)
                .min_by_key(|e| (e.priority, e.created_at))
                .map(|e| e.key().clone());

            match victim {
                Some(key) => {
                    self.store.remove(&key);
                    debug!("✓ InMemory EVICT {} (capacity {})", key, capacity);
                }
                None => {
                    warn!(
                        "⚠ InMemory over capacity ({}) with only NeverRemove entries",
                        capacity
                    );
                    break;
                }
            }
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Only drop the entry if it is still the expired one: a concurrent
        // writer may have replaced it since the read above.
        self.store.remove_if(key, |_, entry| entry.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, options: EntryOptions) -> Result<()> {
        if let Some(capacity) = self.capacity {
            self.make_room(key, capacity);
        }

        self.store
            .insert(key.to_string(), CacheEntry::new(value, options));

        match options.ttl {
            Some(d) => debug!(
                "✓ InMemory SET {} (TTL: {:?}, priority: {:?})",
                key, d, options.priority
            ),
            None => debug!("✓ InMemory SET {} (priority: {:?})", key, options.priority),
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.store.remove(key).is_some();
        debug!("✓ InMemory DELETE {}", key);
        Ok(removed)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let before = self.store.len();
        self.store.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.store.len());
        debug!("✓ InMemory DELETE_PREFIX {} ({} entries)", prefix, removed);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        if let Some(entry) = self.store.get(key) {
            return Ok(!entry.is_expired());
        }

        Ok(false)
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all cache cleared!");
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(ttl: Option<Duration>, priority: CachePriority) -> EntryOptions {
        EntryOptions::new(ttl, priority)
    }

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        assert!(backend.delete("key1").await.expect("Failed to delete"));
        assert!(!backend.delete("key1").await.expect("Failed to delete"));
        assert!(!backend
            .exists("key1")
            .await
            .expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set(
                "key1",
                b"value1".to_vec(),
                opts(Some(Duration::from_millis(100)), CachePriority::NeverRemove),
            )
            .await
            .expect("Failed to set");

        assert!(backend.get("key1").await.expect("Failed to get").is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        // Priority never outlives TTL
        assert!(backend.get("key1").await.expect("Failed to get").is_none());
        assert_eq!(backend.len().await, 0);
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete_prefix() {
        let backend = InMemoryBackend::new();

        for key in ["books_cache_1_5", "books_cache_2_5", "authors_cache_1_5"] {
            backend
                .set(key, b"page".to_vec(), EntryOptions::default())
                .await
                .expect("Failed to set");
        }

        let removed = backend
            .delete_prefix("books_cache_")
            .await
            .expect("Failed to delete prefix");

        assert_eq!(removed, 2);
        assert_eq!(backend.len().await, 1);
        assert!(backend
            .get("authors_cache_1_5")
            .await
            .expect("Failed to get")
            .is_some());
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_all() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");
        backend
            .set("key2", b"value2".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        backend.clear_all().await.expect("Failed to clear");

        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_inmemory_backend_capacity_bound() {
        let backend = InMemoryBackend::with_capacity(2);

        for (key, priority) in [
            ("high", CachePriority::High),
            ("low", CachePriority::Low),
            ("normal", CachePriority::Normal),
        ] {
            backend
                .set(key, b"v".to_vec(), opts(None, priority))
                .await
                .expect("Failed to set");
        }

        assert!(backend.len().await <= 2);
        assert!(backend.exists("normal").await.expect("Failed to check"));
    }

    #[tokio::test]
    async fn test_inmemory_backend_capacity_keeps_never_remove() {
        let backend = InMemoryBackend::with_capacity(2);

        backend
            .set("pinned", b"p".to_vec(), opts(None, CachePriority::NeverRemove))
            .await
            .expect("Failed to set");

        for i in 0..5 {
            let key = format!("page_{}", i);
            backend
                .set(&key, b"v".to_vec(), opts(None, CachePriority::High))
                .await
                .expect("Failed to set");
            assert!(backend.exists(&key).await.expect("Failed to check"));
            assert!(backend.len().await <= 2);
        }

        assert!(backend.exists("pinned").await.expect("Failed to check"));
    }

    #[tokio::test]
    async fn test_inmemory_backend_capacity_purges_expired() {
        let backend = InMemoryBackend::with_capacity(2);

        backend
            .set(
                "stale",
                b"s".to_vec(),
                opts(Some(Duration::from_millis(10)), CachePriority::High),
            )
            .await
            .expect("Failed to set");
        backend
            .set("other", b"o".to_vec(), opts(None, CachePriority::Low))
            .await
            .expect("Failed to set");

        tokio::time::sleep(Duration::from_millis(30)).await;

        backend
            .set("new", b"n".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        assert!(backend.len().await <= 2);
        assert!(backend.exists("new").await.expect("Failed to check"));
        assert_eq!(backend.stats().await.expired_entries, 0);
    }

    #[tokio::test]
    async fn test_inmemory_backend_huge_ttl_never_expires() {
        let backend = InMemoryBackend::new();

        backend
            .set(
                "k",
                b"v".to_vec(),
                EntryOptions::default().with_ttl(Duration::MAX),
            )
            .await
            .expect("Failed to set");
        backend
            .set(
                "k2",
                b"v".to_vec(),
                EntryOptions::default().with_ttl(Duration::from_secs(u64::MAX)),
            )
            .await
            .expect("Failed to set");

        assert_eq!(
            backend.get("k").await.expect("Failed to get"),
            Some(b"v".to_vec())
        );
        assert!(backend.exists("k2").await.expect("Failed to check"));
        assert_eq!(backend.ttl_remaining("k").await, None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_replace_does_not_evict() {
        let backend = InMemoryBackend::with_capacity(1);

        backend
            .set("only", b"v1".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");
        backend
            .set("only", b"v2".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        assert_eq!(
            backend.get("only").await.expect("Failed to get"),
            Some(b"v2".to_vec())
        );
    }

    #[tokio::test]
    async fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value_with_data".to_vec(), EntryOptions::default())
            .await
            .expect("Failed to set");

        let stats = backend.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.total_bytes, 15);
    }

    #[tokio::test]
    async fn test_inmemory_backend_ttl_remaining() {
        let backend = InMemoryBackend::new();
        backend
            .set(
                "k",
                b"v".to_vec(),
                EntryOptions::default().with_ttl(Duration::from_secs(600)),
            )
            .await
            .expect("Failed to set");

        let remaining = backend.ttl_remaining("k").await.expect("TTL missing");
        assert!(remaining <= Duration::from_secs(600));
        assert!(remaining > Duration::from_secs(590));
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                b.set(&key, format!("value_{}", i).into_bytes(), EntryOptions::default())
                    .await
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len().await, 10);
    }
}
