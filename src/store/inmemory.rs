//! In-memory entity store (default, thread-safe).
//!
//! Both tables live behind one `RwLock` so that a cascade delete is a single
//! critical section. `BTreeMap` keeps records ordered by id.

use super::EntityStore;
use crate::error::Result;
use crate::model::{Author, Book, EntityKind, NewAuthor, NewBook};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<u64, Author>,
    books: BTreeMap<u64, Book>,
    last_author_id: u64,
    last_book_id: u64,
}

/// Thread-safe in-memory entity store.
///
/// Cloning is cheap and every clone shares the same tables.
///
/// # Example
///
/// ```no_run
/// use library_cache::model::NewAuthor;
/// use library_cache::store::{EntityStore, InMemoryStore};
///
/// #[tokio::main]
/// async fn main() -> library_cache::Result<()> {
///     let store = InMemoryStore::new();
///     let id = store.insert_author(&NewAuthor::new("Octavia E. Butler")).await?;
///     assert_eq!(id, 1);
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding 5 authors (ids 1-5) and 10 books (ids 1-10),
    /// two consecutive books per author: author 1 owns books 1 and 2,
    /// author 2 owns books 3 and 4, and so on.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut tables = store.write("seed");
            for a in 1..=5u64 {
                let author_id = Self::next_id(&mut tables.last_author_id);
                tables.authors.insert(
                    author_id,
                    Author {
                        id: author_id,
                        name: format!("Author {}", a),
                    },
                );
                for b in 1..=2u64 {
                    let book_id = Self::next_id(&mut tables.last_book_id);
                    tables.books.insert(
                        book_id,
                        Book {
                            id: book_id,
                            title: format!("Book {} by Author {}", b, a),
                            author_id,
                        },
                    );
                }
            }
        }
        store
    }

    fn next_id(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, Tables> {
        match self.tables.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("⚠ InMemoryStore {}: recovered from poisoned lock", op);
                poisoned.into_inner()
            }
        }
    }

    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, Tables> {
        match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("⚠ InMemoryStore {}: recovered from poisoned lock", op);
                poisoned.into_inner()
            }
        }
    }
}

impl EntityStore for InMemoryStore {
    async fn scan_authors(&self, offset: usize, limit: usize) -> Result<Vec<Author>> {
        let tables = self.read("scan_authors");
        Ok(tables
            .authors
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn scan_books(&self, offset: usize, limit: usize) -> Result<Vec<Book>> {
        let tables = self.read("scan_books");
        Ok(tables
            .books
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn books_by_author(&self, author_id: u64) -> Result<Vec<Book>> {
        let tables = self.read("books_by_author");
        Ok(tables
            .books
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn get_author(&self, id: u64) -> Result<Option<Author>> {
        Ok(self.read("get_author").authors.get(&id).cloned())
    }

    async fn get_book(&self, id: u64) -> Result<Option<Book>> {
        Ok(self.read("get_book").books.get(&id).cloned())
    }

    async fn authors_by_ids(&self, ids: &[u64]) -> Result<Vec<Author>> {
        let tables = self.read("authors_by_ids");
        Ok(ids
            .iter()
            .filter_map(|id| tables.authors.get(id).cloned())
            .collect())
    }

    async fn books_by_authors(&self, author_ids: &[u64]) -> Result<Vec<Book>> {
        let wanted: HashSet<u64> = author_ids.iter().copied().collect();
        let tables = self.read("books_by_authors");
        Ok(tables
            .books
            .values()
            .filter(|b| wanted.contains(&b.author_id))
            .cloned()
            .collect())
    }

    async fn page_authors(&self, offset: usize, limit: usize) -> Result<(Vec<Author>, u64)> {
        let tables = self.read("page_authors");
        let authors = tables
            .authors
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((authors, tables.authors.len() as u64))
    }

    async fn page_books(&self, offset: usize, limit: usize) -> Result<(Vec<Book>, u64)> {
        let tables = self.read("page_books");
        let books = tables
            .books
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((books, tables.books.len() as u64))
    }

    async fn insert_author(&self, draft: &NewAuthor) -> Result<u64> {
        let mut tables = self.write("insert_author");
        let id = Self::next_id(&mut tables.last_author_id);
        tables.authors.insert(
            id,
            Author {
                id,
                name: draft.name.clone(),
            },
        );
        debug!("✓ InMemoryStore INSERT authors/{}", id);
        Ok(id)
    }

    async fn insert_book(&self, draft: &NewBook) -> Result<u64> {
        let mut tables = self.write("insert_book");
        let id = Self::next_id(&mut tables.last_book_id);
        tables.books.insert(
            id,
            Book {
                id,
                title: draft.title.clone(),
                author_id: draft.author_id,
            },
        );
        debug!("✓ InMemoryStore INSERT books/{}", id);
        Ok(id)
    }

    async fn update_author(&self, id: u64, draft: &NewAuthor) -> Result<bool> {
        let mut tables = self.write("update_author");
        match tables.authors.get_mut(&id) {
            Some(author) => {
                author.name = draft.name.clone();
                debug!("✓ InMemoryStore UPDATE authors/{}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_book(&self, id: u64, draft: &NewBook) -> Result<bool> {
        let mut tables = self.write("update_book");
        match tables.books.get_mut(&id) {
            Some(book) => {
                book.title = draft.title.clone();
                book.author_id = draft.author_id;
                debug!("✓ InMemoryStore UPDATE books/{}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_author(&self, id: u64) -> Result<bool> {
        let mut tables = self.write("delete_author");
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }

        let before = tables.books.len();
        tables.books.retain(|_, book| book.author_id != id);
        debug!(
            "✓ InMemoryStore DELETE authors/{} (cascaded {} books)",
            id,
            before - tables.books.len()
        );
        Ok(true)
    }

    async fn delete_book(&self, id: u64) -> Result<bool> {
        let removed = self.write("delete_book").books.remove(&id).is_some();
        if removed {
            debug!("✓ InMemoryStore DELETE books/{}", id);
        }
        Ok(removed)
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let tables = self.read("count");
        let n = match kind {
            EntityKind::Authors => tables.authors.len(),
            EntityKind::Books => tables.books.len(),
        };
        Ok(n as u64)
    }
}
