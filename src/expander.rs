//! Cache expander - the read-through cache layer.
//!
//! [`CacheExpander::get_or_compute`] is the core protocol:
//!
//! 1. Look up the key. A live entry is a hit and `compute` is not invoked.
//! 2. Absent or expired: invoke `compute` exactly once.
//! 3. On success store the result with expiry = now + TTL and return it.
//! 4. On failure store nothing and return the error unchanged.
//!
//! There is no dogpile protection. Two concurrent misses on one key both
//! compute and both write; the last write wins. Compute must therefore be
//! side-effect free, which every [`PagedRepository::list`] is.
//!
//! Invalidation is coarse: a mutation drops every cached page of the
//! affected kind via [`CacheExpander::invalidate_prefix`]. A reader that
//! started before the store write may still repopulate a page from the old
//! state; that entry lives until its TTL or the next invalidation.

use crate::backend::{CacheBackend, CachePriority, EntryOptions};
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::model::EntityKind;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::pagination::{Page, PageRequest};
use crate::repository::PagedRepository;
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use crate::strategy::CacheStrategy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

/// Per-operation overrides.
///
/// Setup-time settings live on the `CacheExpander` (`with_ttl_policy`,
/// `with_default_priority`). `OperationConfig` overrides them for a single
/// read without touching the global settings.
///
/// # Example
///
/// ```ignore
/// use library_cache::{CacheStrategy, OperationConfig};
/// use std::time::Duration;
///
/// let config = OperationConfig::default().with_ttl(Duration::from_secs(60));
/// expander.fetch_page_with_config(&repo, &page, CacheStrategy::Refresh, config).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct OperationConfig {
    /// Override the TTL for this operation only.
    ///
    /// - **If `Some(duration)`**: Use this override (takes precedence)
    /// - **If `None`**: Fall back to the expander's `ttl_policy`
    pub ttl_override: Option<Duration>,

    /// Override the eviction priority for this operation only.
    pub priority: Option<CachePriority>,
}

impl OperationConfig {
    /// Override TTL for this operation.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_override = Some(ttl);
        self
    }

    /// Override eviction priority for this operation.
    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Core cache expander - handles lookup, compute-on-miss and invalidation.
///
/// # Example
///
/// ```ignore
/// use library_cache::{CacheExpander, backend::InMemoryBackend};
///
/// let expander = CacheExpander::new(InMemoryBackend::new());
/// let page = expander
///     .get_or_compute("books_cache_1_5", || repo.list(&req), Some(ttl), CachePriority::Normal)
///     .await?;
/// ```
pub struct CacheExpander<B: CacheBackend> {
    backend: B,
    metrics: Box<dyn CacheMetrics>,
    pub(crate) ttl_policy: TtlPolicy,
    default_priority: CachePriority,
}

impl<B: CacheBackend> CacheExpander<B> {
    /// Create new expander with given backend.
    pub fn new(backend: B) -> Self {
        CacheExpander {
            backend,
            metrics: Box::new(NoOpMetrics),
            ttl_policy: TtlPolicy::default(),
            default_priority: CachePriority::default(),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set custom TTL policy.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Set the priority used when an operation does not override it.
    pub fn with_default_priority(mut self, priority: CachePriority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Return the cached value under `key`, or compute, store and return it.
    ///
    /// `compute` is invoked at most once per call, and only on a miss.
    /// A cached entry that fails to decode is evicted and treated as a miss.
    ///
    /// # Errors
    ///
    /// - Any error returned by `compute`, unchanged. Nothing is cached.
    /// - `Error::SerializationError`: the computed value could not be encoded
    /// - Backend errors from the lookup
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
        priority: CachePriority,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timer = Instant::now();

        if let Some(bytes) = self.backend.get(key).await? {
            match deserialize_from_cache::<T>(&bytes) {
                Ok(value) => {
                    self.metrics.record_hit(key, timer.elapsed());
                    debug!("✓ Cache hit for {}", key);
                    return Ok(value);
                }
                Err(e @ (Error::InvalidCacheEntry(_) | Error::DeserializationError(_))) => {
                    warn!("Evicting unreadable cache entry {}: {}", key, e);
                    self.metrics.record_error(key, &e.to_string());
                    self.backend.delete(key).await?;
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Cache miss for {}, computing", key);

        let value = match compute().await {
            Ok(value) => value,
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                return Err(e);
            }
        };
        self.metrics.record_miss(key, timer.elapsed());

        let bytes = serialize_for_cache(&value)?;
        let set_timer = Instant::now();
        match self
            .backend
            .set(key, bytes, EntryOptions::new(ttl, priority))
            .await
        {
            Ok(()) => self.metrics.record_set(key, set_timer.elapsed()),
            // The value is still correct; the next read recomputes.
            Err(e) => {
                warn!("Failed to store {} in cache: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
            }
        }

        Ok(value)
    }

    /// Read one page through the cache with the given strategy.
    ///
    /// # Errors
    /// Same as [`CacheExpander::get_or_compute`].
    pub async fn fetch_page<R: PagedRepository>(
        &self,
        repository: &R,
        page: &PageRequest,
        strategy: CacheStrategy,
    ) -> Result<Page<R::Item>> {
        self.fetch_page_with_config(repository, page, strategy, OperationConfig::default())
            .await
    }

    /// Read one page with per-operation TTL and priority overrides.
    ///
    /// # Errors
    /// Same as [`CacheExpander::get_or_compute`].
    pub async fn fetch_page_with_config<R: PagedRepository>(
        &self,
        repository: &R,
        page: &PageRequest,
        strategy: CacheStrategy,
        config: OperationConfig,
    ) -> Result<Page<R::Item>> {
        let kind = repository.kind();
        let cache_key = CacheKeyBuilder::page_key(kind, page);

        debug!(
            "» Page read for key: {} (strategy: {})",
            cache_key, strategy
        );

        let ttl = config
            .ttl_override
            .or_else(|| self.ttl_policy.get_ttl(kind));
        let priority = config.priority.unwrap_or(self.default_priority);

        match strategy {
            CacheStrategy::Refresh => {
                self.get_or_compute(&cache_key, || repository.list(page), ttl, priority)
                    .await
            }
            CacheStrategy::Invalidate => {
                self.invalidate(&cache_key).await?;
                self.get_or_compute(&cache_key, || repository.list(page), ttl, priority)
                    .await
            }
            CacheStrategy::Bypass => repository.list(page).await,
        }
    }

    /// Remove a single entry. Returns whether it was present.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn invalidate(&self, key: &str) -> Result<bool> {
        let removed = self.backend.delete(key).await?;
        self.metrics.record_invalidate(key, removed as usize);
        Ok(removed)
    }

    /// Remove every cached page of one entity kind.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn invalidate_prefix(&self, kind: EntityKind) -> Result<usize> {
        let prefix = CacheKeyBuilder::kind_prefix(kind);
        let removed = self.backend.delete_prefix(&prefix).await?;
        self.metrics.record_invalidate(&prefix, removed);
        info!("✓ Invalidated {} cached {} pages", removed, kind);
        Ok(removed)
    }

    /// Remove everything.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails.
    pub async fn invalidate_all(&self) -> Result<()> {
        self.backend.clear_all().await
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
