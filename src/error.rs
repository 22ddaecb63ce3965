//! Error types for the library cache.

use crate::model::EntityKind;
use std::fmt;

/// Result type for library and cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library service.
///
/// Every operation returns `Result<T>`. The first four variants are the
/// caller-facing taxonomy; the remaining ones come from the cache layer's
/// own encoding and configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A required field was missing or empty, or a pagination parameter was
    /// out of range.
    ///
    /// Maps to "bad request" at the HTTP boundary.
    ValidationError(String),

    /// The id does not resolve in the entity store.
    NotFound {
        /// Entity kind that was looked up
        kind: EntityKind,
        /// The id that did not resolve
        id: u64,
    },

    /// A book references an author that does not exist.
    ///
    /// Raised before any store write happens. Belongs to the not-found class
    /// (see [`Error::is_not_found`]).
    ReferentialIntegrity {
        /// The author id the book pointed at
        author_id: u64,
    },

    /// The underlying store operation failed.
    ///
    /// Common causes:
    /// - I/O fault in a persistent store
    /// - Store lock unavailable
    ///
    /// **Recovery:** None automatic. Retrying is a caller concern since
    /// create is not idempotent.
    StoreError(String),

    /// Encoding a page for cache storage failed.
    SerializationError(String),

    /// Decoding a cached page failed.
    ///
    /// **Recovery:** The entry is evicted and the page recomputed.
    DeserializationError(String),

    /// Cache entry header is invalid (bad magic or schema version).
    ///
    /// **Recovery:** The entry is evicted and the page recomputed.
    InvalidCacheEntry(String),

    /// Invalid configuration value.
    ConfigError(String),
}

impl Error {
    /// Build a validation error from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::ValidationError(msg.into())
    }

    /// True for both a missing id and a dangling author reference.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::ReferentialIntegrity { .. }
        )
    }

    /// HTTP status the routing layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::ValidationError(_) => 400,
            Error::NotFound { .. } | Error::ReferentialIntegrity { .. } => 404,
            _ => 500,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::NotFound { kind, id } => write!(f, "Not found: {} with id {}", kind, id),
            Error::ReferentialIntegrity { author_id } => {
                write!(f, "Referential integrity: author {} does not exist", author_id)
            }
            Error::StoreError(msg) => write!(f, "Store error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::StoreError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::DeserializationError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StoreError(e.to_string())
    }
}
