//! Entity store interface.
//!
//! The store owns the authoritative author and book records. The cache layer
//! and repositories only ever see it through [`EntityStore`], so a database
//! backed implementation can replace [`InMemoryStore`] without touching them.

use crate::error::Result;
use crate::model::{Author, Book, EntityKind, NewAuthor, NewBook};
use futures::future::try_join_all;

pub mod inmemory;

pub use inmemory::InMemoryStore;

/// Trait for entity store implementations.
///
/// **Ordering:** every scan returns records in ascending id order. Ids are
/// assigned by the store, increase monotonically per kind and are never
/// reused, so appending a record never shifts an earlier page.
///
/// **Atomicity:** each method is a single logical operation. In particular
/// [`EntityStore::delete_author`] removes the author and all of its books
/// as one unit: no reader may observe the author gone while its books remain.
///
/// The store does not enforce referential integrity on book writes; the
/// mutation handler checks the author reference before calling it.
///
/// **ASYNC:** All methods are async and must be awaited. Implementations are
/// treated as non-cancellable.
#[allow(async_fn_in_trait)]
pub trait EntityStore: Send + Sync {
    /// Scan authors in ascending id order, skipping `offset` and returning at
    /// most `limit` records.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn scan_authors(&self, offset: usize, limit: usize) -> Result<Vec<Author>>;

    /// Scan books in ascending id order, skipping `offset` and returning at
    /// most `limit` records.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn scan_books(&self, offset: usize, limit: usize) -> Result<Vec<Book>>;

    /// All books owned by one author, in ascending id order.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn books_by_author(&self, author_id: u64) -> Result<Vec<Book>>;

    /// Point lookup of an author.
    ///
    /// # Returns
    /// - `Ok(Some(author))` - Author found
    /// - `Ok(None)` - No author with this id (not an error)
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn get_author(&self, id: u64) -> Result<Option<Author>>;

    /// Point lookup of a book.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn get_book(&self, id: u64) -> Result<Option<Book>>;

    /// Batch author lookup (optional optimization).
    ///
    /// Default implementation calls `get_author()` for each id and skips ids
    /// that do not resolve. Override for efficiency (e.g. SQL `WHERE id IN (...)`).
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn authors_by_ids(&self, ids: &[u64]) -> Result<Vec<Author>> {
        let mut authors = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(author) = self.get_author(*id).await? {
                authors.push(author);
            }
        }
        Ok(authors)
    }

    /// Books of several authors, in ascending book id order.
    ///
    /// Default implementation issues `books_by_author()` for each id
    /// concurrently. Override with a single query (e.g. SQL
    /// `WHERE author_id IN (...)`).
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn books_by_authors(&self, author_ids: &[u64]) -> Result<Vec<Book>> {
        let per_author =
            try_join_all(author_ids.iter().map(|id| self.books_by_author(*id))).await?;
        let mut books: Vec<Book> = per_author.into_iter().flatten().collect();
        books.sort_unstable_by_key(|b| b.id);
        books.dedup_by_key(|b| b.id);
        Ok(books)
    }

    /// One page of authors together with the total author count.
    ///
    /// The default calls `count()` then `scan_authors()`, which may observe
    /// two different states under concurrent writes. Stores that can read
    /// both from one snapshot should override it.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn page_authors(&self, offset: usize, limit: usize) -> Result<(Vec<Author>, u64)> {
        let total = self.count(EntityKind::Authors).await?;
        let authors = self.scan_authors(offset, limit).await?;
        Ok((authors, total))
    }

    /// One page of books together with the total book count.
    ///
    /// Same snapshot caveat as [`EntityStore::page_authors`].
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn page_books(&self, offset: usize, limit: usize) -> Result<(Vec<Book>, u64)> {
        let total = self.count(EntityKind::Books).await?;
        let books = self.scan_books(offset, limit).await?;
        Ok((books, total))
    }

    /// Insert an author and return its assigned id.
    ///
    /// # Errors
    /// Returns `Err` if the store write fails.
    async fn insert_author(&self, draft: &NewAuthor) -> Result<u64>;

    /// Insert a book and return its assigned id.
    ///
    /// # Errors
    /// Returns `Err` if the store write fails.
    async fn insert_book(&self, draft: &NewBook) -> Result<u64>;

    /// Replace an author's fields.
    ///
    /// # Returns
    /// - `Ok(true)` - Updated
    /// - `Ok(false)` - No author with this id
    ///
    /// # Errors
    /// Returns `Err` if the store write fails.
    async fn update_author(&self, id: u64, draft: &NewAuthor) -> Result<bool>;

    /// Replace a book's fields.
    ///
    /// # Errors
    /// Returns `Err` if the store write fails.
    async fn update_book(&self, id: u64, draft: &NewBook) -> Result<bool>;

    /// Delete an author and, atomically, every book that references it.
    ///
    /// # Returns
    /// - `Ok(true)` - Author and its books removed
    /// - `Ok(false)` - No author with this id, nothing removed
    ///
    /// # Errors
    /// Returns `Err` if the store write fails. On error nothing is removed.
    async fn delete_author(&self, id: u64) -> Result<bool>;

    /// Delete a single book.
    ///
    /// # Errors
    /// Returns `Err` if the store write fails.
    async fn delete_book(&self, id: u64) -> Result<bool>;

    /// Number of live records of one kind.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    async fn count(&self, kind: EntityKind) -> Result<u64>;
}
