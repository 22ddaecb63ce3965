//! Paginated read repositories for authors and books.
//!
//! A repository turns store records into a [`Page`] of DTOs. It owns the
//! skip/take arithmetic and the explicit joins (book → author name,
//! author → its books). No caching happens here: `list` is a pure read with
//! no side effects, which is what lets the cache layer call it more than once
//! for the same key without harm.
//!
//! # Joins are explicit
//!
//! Nothing is loaded lazily. A books page issues one batch author lookup for
//! the distinct authors on that page; an authors page issues one batch books
//! lookup for the authors on that page. Records and `total_count` come from
//! one store call, so a page never disagrees with its own total.

use crate::error::Result;
use crate::model::{AuthorDto, Book, BookDto, EntityKind};
use crate::pagination::{Page, PageRequest};
use crate::store::EntityStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for paginated DTO repositories.
///
/// Ordering is ascending by id, so concatenating pages 1..n of a stable
/// collection reproduces it exactly with no duplicates and no gaps.
#[allow(async_fn_in_trait)]
pub trait PagedRepository: Send + Sync {
    /// DTO type produced for each record.
    type Item: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Entity kind this repository reads.
    fn kind(&self) -> EntityKind;

    /// Read one page.
    ///
    /// A page past the end yields empty `data` with the real `total_count`.
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    async fn list(&self, page: &PageRequest) -> Result<Page<Self::Item>>;
}

/// Authors, each projected with its own books nested.
pub struct AuthorRepository<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> AuthorRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        AuthorRepository { store }
    }

    /// Project a single author with its books, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    pub async fn find(&self, id: u64) -> Result<Option<AuthorDto>> {
        match self.store.get_author(id).await? {
            Some(author) => {
                let books = self.store.books_by_author(author.id).await?;
                Ok(Some(AuthorDto::project(&author, &books)))
            }
            None => Ok(None),
        }
    }
}

impl<S: EntityStore> Clone for AuthorRepository<S> {
    fn clone(&self) -> Self {
        AuthorRepository {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> PagedRepository for AuthorRepository<S> {
    type Item = AuthorDto;

    fn kind(&self) -> EntityKind {
        EntityKind::Authors
    }

    async fn list(&self, page: &PageRequest) -> Result<Page<AuthorDto>> {
        let (authors, total) = self
            .store
            .page_authors(page.offset(), page.limit())
            .await?;

        let author_ids: Vec<u64> = authors.iter().map(|a| a.id).collect();
        let mut nested: HashMap<u64, Vec<Book>> = HashMap::with_capacity(authors.len());
        for book in self.store.books_by_authors(&author_ids).await? {
            nested.entry(book.author_id).or_default().push(book);
        }

        let data: Vec<AuthorDto> = authors
            .iter()
            .map(|author| {
                let books = nested.get(&author.id).map(Vec::as_slice).unwrap_or(&[]);
                AuthorDto::project(author, books)
            })
            .collect();

        debug!(
            "AuthorRepository list page {} size {} -> {} of {}",
            page.page_number(),
            page.page_size(),
            data.len(),
            total
        );
        Ok(Page::new(data, total, page))
    }
}

/// Books, each projected with its author's name.
pub struct BookRepository<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> BookRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        BookRepository { store }
    }

    /// Project a single book with its author name, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    pub async fn find(&self, id: u64) -> Result<Option<BookDto>> {
        match self.store.get_book(id).await? {
            Some(book) => {
                let author_name = self
                    .store
                    .get_author(book.author_id)
                    .await?
                    .map(|a| a.name)
                    .unwrap_or_default();
                Ok(Some(BookDto::project(&book, author_name)))
            }
            None => Ok(None),
        }
    }
}

impl<S: EntityStore> Clone for BookRepository<S> {
    fn clone(&self) -> Self {
        BookRepository {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> PagedRepository for BookRepository<S> {
    type Item = BookDto;

    fn kind(&self) -> EntityKind {
        EntityKind::Books
    }

    async fn list(&self, page: &PageRequest) -> Result<Page<BookDto>> {
        let (books, total) = self
            .store
            .page_books(page.offset(), page.limit())
            .await?;

        let mut author_ids: Vec<u64> = books.iter().map(|b| b.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let names: HashMap<u64, String> = self
            .store
            .authors_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();

        // Cascade delete keeps every book's author live; an unresolved id
        // projects an empty name instead of failing the page.
        let data = books
            .iter()
            .map(|b| {
                let name = names.get(&b.author_id).cloned().unwrap_or_default();
                BookDto::project(b, name)
            })
            .collect::<Vec<_>>();

        debug!(
            "BookRepository list page {} size {} -> {} of {}",
            page.page_number(),
            page.page_size(),
            data.len(),
            total
        );
        Ok(Page::new(data, total, page))
    }
}
