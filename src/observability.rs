//! Metrics hooks and TTL policies for the cache layer.
//!
//! # Metrics
//!
//! Implement [`CacheMetrics`] to feed hit/miss/invalidation counts into a
//! monitoring system. The trait's default methods log through the `log`
//! crate; [`NoOpMetrics`] discards everything and is what a
//! [`CacheExpander`](crate::CacheExpander) uses unless told otherwise.
//!
//! # TTL Policies
//!
//! ```
//! use library_cache::model::EntityKind;
//! use library_cache::observability::TtlPolicy;
//! use std::time::Duration;
//!
//! // Default: 10 minutes for every page
//! let policy = TtlPolicy::default();
//! assert_eq!(policy.get_ttl(EntityKind::Books), Some(Duration::from_secs(600)));
//!
//! // Authors change rarely
//! let _policy = TtlPolicy::PerKind(|kind| match kind {
//!     EntityKind::Authors => Duration::from_secs(1800),
//!     EntityKind::Books => Duration::from_secs(600),
//! });
//! ```
//!
//! TTLs are absolute from the write. A hit never extends an entry's life.

use crate::model::EntityKind;
use std::time::Duration;

/// TTL applied when nothing else is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Page cache HIT {} ({:?})", key, duration);
    }

    /// Record a cache miss (compute was invoked).
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Page cache MISS {} ({:?})", key, duration);
    }

    /// Record a cache write.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Page cache SET {} ({:?})", key, duration);
    }

    /// Record an invalidation of a key or prefix and how many entries it dropped.
    fn record_invalidate(&self, target: &str, removed: usize) {
        debug!("Cache INVALIDATE: {} dropped {} entries", target, removed);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Page cache error on {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_invalidate(&self, _target: &str, _removed: usize) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics handler that only logs, using the trait's default methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// TTL (Time-to-Live) policy for cached pages.
#[derive(Clone, Debug)]
pub enum TtlPolicy {
    /// Fixed duration for every page
    Fixed(Duration),

    /// No TTL (entries live until invalidated or evicted)
    Infinite,

    /// Per-kind policy
    PerKind(fn(EntityKind) -> Duration),
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::Fixed(DEFAULT_TTL)
    }
}

impl TtlPolicy {
    /// Get TTL for an entity kind.
    pub fn get_ttl(&self, kind: EntityKind) -> Option<Duration> {
        match self {
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::Infinite => None,
            TtlPolicy::PerKind(f) => Some(f(kind)),
        }
    }
}
