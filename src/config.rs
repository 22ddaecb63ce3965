//! Service configuration.
//!
//! Every field has a documented default, so `LibraryConfig::default()` is a
//! working configuration. Values can be overridden from the environment or
//! deserialized from any serde source.

use crate::backend::CachePriority;
use crate::error::{Error, Result};
use crate::observability::DEFAULT_TTL;
use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::Deserialize;
use std::time::Duration;

pub const ENV_CACHE_TTL_SECS: &str = "LIBRARY_CACHE_TTL_SECS";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "LIBRARY_DEFAULT_PAGE_SIZE";
pub const ENV_CACHE_CAPACITY: &str = "LIBRARY_CACHE_CAPACITY";

/// Upper bound on `cache_ttl_secs` (30 days).
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration for a [`LibraryService`](crate::LibraryService).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Page size applied when a request omits `pageSize`.
    pub default_page_size: u32,
    /// Absolute TTL of a cached page, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached pages. `None` = unbounded.
    pub cache_capacity: Option<usize>,
    /// Eviction hint given to every cached page.
    pub default_priority: CachePriority,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            cache_capacity: None,
            default_priority: CachePriority::Normal,
        }
    }
}

impl LibraryConfig {
    /// Defaults overridden by any of `LIBRARY_CACHE_TTL_SECS`,
    /// `LIBRARY_DEFAULT_PAGE_SIZE` and `LIBRARY_CACHE_CAPACITY`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but malformed, or
    /// the resulting configuration fails [`LibraryConfig::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`LibraryConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LibraryConfig::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl_secs = parse_var(ENV_CACHE_TTL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_PAGE_SIZE) {
            config.default_page_size = parse_var(ENV_DEFAULT_PAGE_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            config.cache_capacity = Some(parse_var(ENV_CACHE_CAPACITY, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Error::ConfigError` for a TTL outside `1..=MAX_CACHE_TTL_SECS`,
    /// a zero or oversized default page size, or a zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 || self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(Error::ConfigError(format!(
                "cache_ttl_secs must be within 1..={}",
                MAX_CACHE_TTL_SECS
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(Error::ConfigError(format!(
                "default_page_size must be within 1..={}",
                MAX_PAGE_SIZE
            )));
        }
        if self.cache_capacity == Some(0) {
            return Err(Error::ConfigError("cache_capacity must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::ConfigError(format!("{} has invalid value {:?}", name, raw)))
}
