//! Cache strategies for page reads.
//!
//! | Strategy | Cache Hit | Cache Miss | Use Case |
//! |----------|-----------|-----------|----------|
//! | **Refresh** | Return | Compute, store | Default read-through (`/memory-cache` endpoints) |
//! | **Invalidate** | Evict, compute, store | Compute, store | Caller knows the page is stale |
//! | **Bypass** | Ignored | Compute | Plain endpoints; cache neither read nor written |

/// Strategy enum controlling how a page read uses the cache.
///
/// # Examples
///
/// ```
/// use library_cache::strategy::CacheStrategy;
///
/// assert_eq!(CacheStrategy::default(), CacheStrategy::Refresh);
/// assert_eq!(CacheStrategy::Bypass.to_string(), "Bypass");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// **Refresh**: Try cache first, compute from the repository on miss.
    ///
    /// Flow:
    /// 1. Check cache (expired entries count as absent)
    /// 2. If hit: return cached page
    /// 3. If miss: list from repository
    /// 4. Store with expiry = now + TTL
    /// 5. Return page
    #[default]
    Refresh,

    /// **Invalidate**: Drop the cached page, then behave like `Refresh`.
    Invalidate,

    /// **Bypass**: Read straight from the repository. The cache is neither
    /// consulted nor populated.
    Bypass,
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::Refresh => write!(f, "Refresh"),
            CacheStrategy::Invalidate => write!(f, "Invalidate"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
