//! Cache key construction for paginated result sets.
//!
//! Key format: `{kind}_cache_{page_number}_{page_size}`.
//!
//! The kind prefix (`{kind}_cache_`) is what prefix invalidation sweeps. No
//! kind name is a prefix of another, so sweeping one kind never touches the
//! other kind's pages.

use crate::model::EntityKind;
use crate::pagination::PageRequest;

const KEY_INFIX: &str = "_cache_";

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the key for one page of one entity kind.
    ///
    /// Identical parameters always yield the identical key, and distinct
    /// `(kind, page_number, page_size)` tuples never share a key: both numbers
    /// are rendered in full and separated by `_`, which cannot occur inside a
    /// decimal number.
    pub fn page_key(kind: EntityKind, page: &PageRequest) -> String {
        format!(
            "{}{}{}_{}",
            kind.as_str(),
            KEY_INFIX,
            page.page_number(),
            page.page_size()
        )
    }

    /// Prefix shared by every page key of `kind`.
    pub fn kind_prefix(kind: EntityKind) -> String {
        format!("{}{}", kind.as_str(), KEY_INFIX)
    }

    /// Parse a page key back into its parts.
    pub fn parse(key: &str) -> Option<(EntityKind, u32, u32)> {
        let kind = EntityKind::all()
            .into_iter()
            .find(|k| key.starts_with(&Self::kind_prefix(*k)))?;
        let rest = &key[Self::kind_prefix(kind).len()..];
        let (number, size) = rest.split_once('_')?;
        Some((kind, number.parse().ok()?, size.parse().ok()?))
    }
}
