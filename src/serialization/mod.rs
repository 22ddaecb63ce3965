//! Postcard encoding of cached pages with a versioned envelope.
//!
//! Every cache entry follows this format:
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "LBCK"              u32               postcard::to_allocvec(T)
//! ```
//!
//! Encoding is deterministic, so two hits on the same entry return
//! byte-identical pages. A bad magic or version makes the cache layer evict
//! the entry and recompute it rather than fail the read.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for cached pages.
pub const CACHE_MAGIC: [u8; 4] = *b"LBCK";

/// Current schema version of the cached DTOs.
///
/// Bump when `AuthorDto`, `BookDto` or `Page` change shape so that old
/// entries are recomputed instead of misread.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around a cached value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value with its envelope for cache storage.
///
/// # Errors
/// Returns `Error::SerializationError` if postcard cannot encode the value.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&CacheEnvelope::new(value)).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a cached value, validating magic and schema version.
///
/// # Errors
/// - `Error::DeserializationError`: corrupted or truncated payload
/// - `Error::InvalidCacheEntry`: wrong magic or schema version
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes)?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "bad magic {:?}",
            envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::InvalidCacheEntry(format!(
            "schema version {} (expected {})",
            envelope.version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(envelope.payload)
}
