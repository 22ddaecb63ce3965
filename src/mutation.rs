//! Mutation handler: validated writes followed by coarse cache invalidation.
//!
//! Every operation runs in the same order:
//!
//! 1. Validate required fields (`ValidationError`).
//! 2. Resolve referenced ids (`NotFound`, `ReferentialIntegrity`). No store
//!    write has happened yet.
//! 3. Apply the change to the store as one logical operation.
//! 4. Only after the store succeeded, drop every cached page of each kind
//!    whose listings could now be stale.
//!
//! Which kinds a mutation invalidates:
//!
//! | Mutation | Authors pages | Books pages |
//! |----------|---------------|-------------|
//! | create author | ✓ | |
//! | update author | ✓ | ✓ (author name is joined into book pages) |
//! | delete author | ✓ | ✓ (books cascade) |
//! | create / update / delete book | ✓ (nested book lists) | ✓ |
//!
//! Deleting an author cascades to its books inside the store.

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::expander::CacheExpander;
use crate::model::{AuthorDto, BookDto, EntityKind, NewAuthor, NewBook};
use crate::repository::{AuthorRepository, BookRepository};
use crate::store::EntityStore;
use std::sync::Arc;

/// Performs create/update/delete against the store and invalidates the cache.
pub struct MutationHandler<S: EntityStore, B: CacheBackend> {
    store: Arc<S>,
    cache: Arc<CacheExpander<B>>,
    authors: AuthorRepository<S>,
    books: BookRepository<S>,
}

impl<S: EntityStore, B: CacheBackend> MutationHandler<S, B> {
    pub fn new(store: Arc<S>, cache: Arc<CacheExpander<B>>) -> Self {
        MutationHandler {
            authors: AuthorRepository::new(Arc::clone(&store)),
            books: BookRepository::new(Arc::clone(&store)),
            store,
            cache,
        }
    }

    // ========================================================================
    // Authors
    // ========================================================================

    /// Create an author. Returns the new author with an empty book list.
    ///
    /// # Errors
    /// - `Error::ValidationError`: empty name
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn create_author(&self, draft: &NewAuthor) -> Result<AuthorDto> {
        draft.validate()?;

        let id = self.store.insert_author(draft).await?;
        info!("[Mutation] Created author {}", id);

        self.invalidate(&[EntityKind::Authors]).await;

        Ok(AuthorDto {
            id,
            name: draft.name.clone(),
            books: Vec::new(),
        })
    }

    /// Replace an author's name.
    ///
    /// # Errors
    /// - `Error::ValidationError`: empty name
    /// - `Error::NotFound`: no author with this id
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn update_author(&self, id: u64, draft: &NewAuthor) -> Result<AuthorDto> {
        draft.validate()?;

        if !self.store.update_author(id, draft).await? {
            return Err(not_found(EntityKind::Authors, id));
        }
        info!("[Mutation] Updated author {}", id);

        self.invalidate(&[EntityKind::Authors, EntityKind::Books])
            .await;

        self.authors
            .find(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Authors, id))
    }

    /// Delete an author and, in the same store operation, all of its books.
    ///
    /// # Errors
    /// - `Error::NotFound`: no author with this id
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn delete_author(&self, id: u64) -> Result<()> {
        if !self.store.delete_author(id).await? {
            return Err(not_found(EntityKind::Authors, id));
        }
        info!("[Mutation] Deleted author {} with its books", id);

        self.invalidate(&[EntityKind::Authors, EntityKind::Books])
            .await;
        Ok(())
    }

    // ========================================================================
    // Books
    // ========================================================================

    /// Create a book for an existing author.
    ///
    /// # Errors
    /// - `Error::ValidationError`: empty title
    /// - `Error::ReferentialIntegrity`: the author does not exist; nothing is written
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn create_book(&self, draft: &NewBook) -> Result<BookDto> {
        draft.validate()?;
        let author_name = self.resolve_author(draft.author_id).await?;

        let id = self.store.insert_book(draft).await?;
        info!(
            "[Mutation] Created book {} for author {}",
            id, draft.author_id
        );

        self.invalidate(&[EntityKind::Books, EntityKind::Authors])
            .await;

        Ok(BookDto {
            id,
            title: draft.title.clone(),
            author_id: draft.author_id,
            author_name,
        })
    }

    /// Replace a book's title and author.
    ///
    /// # Errors
    /// - `Error::ValidationError`: empty title
    /// - `Error::NotFound`: no book with this id
    /// - `Error::ReferentialIntegrity`: the new author does not exist
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn update_book(&self, id: u64, draft: &NewBook) -> Result<BookDto> {
        draft.validate()?;

        if self.store.get_book(id).await?.is_none() {
            return Err(not_found(EntityKind::Books, id));
        }
        let author_name = self.resolve_author(draft.author_id).await?;

        if !self.store.update_book(id, draft).await? {
            return Err(not_found(EntityKind::Books, id));
        }
        info!("[Mutation] Updated book {}", id);

        self.invalidate(&[EntityKind::Books, EntityKind::Authors])
            .await;

        Ok(BookDto {
            id,
            title: draft.title.clone(),
            author_id: draft.author_id,
            author_name,
        })
    }

    /// Delete a single book.
    ///
    /// # Errors
    /// - `Error::NotFound`: no book with this id
    /// - `Error::StoreError`: store write failed (no invalidation)
    pub async fn delete_book(&self, id: u64) -> Result<()> {
        if !self.store.delete_book(id).await? {
            return Err(not_found(EntityKind::Books, id));
        }
        info!("[Mutation] Deleted book {}", id);

        self.invalidate(&[EntityKind::Books, EntityKind::Authors])
            .await;
        Ok(())
    }

    /// Single book projection, bypassing the page cache.
    pub async fn find_book(&self, id: u64) -> Result<BookDto> {
        self.books
            .find(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Books, id))
    }

    /// Single author projection, bypassing the page cache.
    pub async fn find_author(&self, id: u64) -> Result<AuthorDto> {
        self.authors
            .find(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::Authors, id))
    }

    async fn resolve_author(&self, author_id: u64) -> Result<String> {
        match self.store.get_author(author_id).await? {
            Some(author) => Ok(author.name),
            None => {
                debug!("[Mutation] Rejected book write: author {} missing", author_id);
                Err(Error::ReferentialIntegrity { author_id })
            }
        }
    }

    /// Drop every cached page of `kinds`.
    ///
    /// The store write already succeeded, so a cache failure is logged
    /// rather than reported as a failed mutation; the stale pages then live
    /// at most until their TTL.
    async fn invalidate(&self, kinds: &[EntityKind]) {
        for kind in kinds {
            if let Err(e) = self.cache.invalidate_prefix(*kind).await {
                warn!("[Mutation] Failed to invalidate {} cache: {}", kind, e);
            }
        }
    }
}

impl<S: EntityStore, B: CacheBackend> Clone for MutationHandler<S, B> {
    fn clone(&self) -> Self {
        MutationHandler {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            authors: self.authors.clone(),
            books: self.books.clone(),
        }
    }
}

fn not_found(kind: EntityKind, id: u64) -> Error {
    Error::NotFound { kind, id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EntryOptions, InMemoryBackend};
    use crate::store::InMemoryStore;

    async fn handler_with_warm_cache() -> (
        MutationHandler<InMemoryStore, InMemoryBackend>,
        InMemoryBackend,
        Arc<InMemoryStore>,
    ) {
        let store = Arc::new(InMemoryStore::seeded());
        let backend = InMemoryBackend::new();
        for key in ["authors_cache_1_5", "books_cache_1_5", "books_cache_2_3"] {
            backend
                .set(key, b"stale".to_vec(), EntryOptions::default())
                .await
                .expect("Failed to set");
        }
        let cache = Arc::new(CacheExpander::new(backend.clone()));
        (
            MutationHandler::new(Arc::clone(&store), cache),
            backend,
            store,
        )
    }

    #[tokio::test]
    async fn test_create_author_invalidates_authors_only() {
        let (handler, backend, _) = handler_with_warm_cache().await;

        let created = handler
            .create_author(&NewAuthor::new("N. K. Jemisin"))
            .await
            .expect("Failed to create");

        assert_eq!(created.id, 6);
        assert!(created.books.is_empty());
        assert!(!backend.exists("authors_cache_1_5").await.unwrap());
        assert!(backend.exists("books_cache_1_5").await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_cache() {
        let (handler, backend, store) = handler_with_warm_cache().await;

        let err = handler
            .create_author(&NewAuthor::new(""))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ValidationError(_)));
        assert_eq!(backend.len().await, 3);
        assert_eq!(store.count(EntityKind::Authors).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_create_book_with_missing_author() {
        let (handler, backend, store) = handler_with_warm_cache().await;

        let err = handler
            .create_book(&NewBook::new("Orphan", 404))
            .await
            .unwrap_err();

        assert_eq!(err, Error::ReferentialIntegrity { author_id: 404 });
        assert!(err.is_not_found());
        assert_eq!(store.count(EntityKind::Books).await.unwrap(), 10);
        assert_eq!(backend.len().await, 3);
    }

    #[tokio::test]
    async fn test_create_book_invalidates_both_kinds() {
        let (handler, backend, _) = handler_with_warm_cache().await;

        let book = handler
            .create_book(&NewBook::new("New Title", 2))
            .await
            .expect("Failed to create");

        assert_eq!(book.id, 11);
        assert_eq!(book.author_name, "Author 2");
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_missing_ids() {
        let (handler, backend, _) = handler_with_warm_cache().await;

        let err = handler
            .update_author(99, &NewAuthor::new("x"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotFound {
                kind: EntityKind::Authors,
                id: 99
            }
        );

        let err = handler
            .update_book(99, &NewBook::new("x", 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotFound {
                kind: EntityKind::Books,
                id: 99
            }
        );

        assert_eq!(backend.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_book_moves_author() {
        let (handler, _, store) = handler_with_warm_cache().await;

        let updated = handler
            .update_book(1, &NewBook::new("Moved", 3))
            .await
            .expect("Failed to update");

        assert_eq!(updated.author_name, "Author 3");
        assert_eq!(store.books_by_author(3).await.unwrap().len(), 3);
        assert_eq!(store.books_by_author(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_author_returns_books() {
        let (handler, backend, _) = handler_with_warm_cache().await;

        let author = handler
            .update_author(2, &NewAuthor::new("Renamed"))
            .await
            .expect("Failed to update");

        assert_eq!(author.name, "Renamed");
        assert_eq!(author.books.len(), 2);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_author_cascades_and_invalidates() {
        let (handler, backend, store) = handler_with_warm_cache().await;

        handler.delete_author(1).await.expect("Failed to delete");

        assert!(backend.is_empty().await);
        assert_eq!(store.count(EntityKind::Books).await.unwrap(), 8);
        assert!(handler.find_book(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_book() {
        let (handler, backend, _) = handler_with_warm_cache().await;

        let err = handler.delete_book(77).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.len().await, 3);
    }
}
