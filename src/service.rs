//! High-level library service.
//!
//! Wires one store, one cache backend and one [`LibraryConfig`] together.
//!
//! # Lifetime
//!
//! Build a single `LibraryService` at process start and hand clones of it to
//! every request handler. Clones share the same store and the same cache
//! through `Arc`; there is no global or lazily-initialized instance. The
//! cache lives exactly as long as the last clone.

use crate::backend::{CacheBackend, InMemoryBackend};
use crate::config::LibraryConfig;
use crate::error::Result;
use crate::expander::CacheExpander;
use crate::model::{AuthorDto, BookDto, NewAuthor, NewBook};
use crate::mutation::MutationHandler;
use crate::observability::{CacheMetrics, TtlPolicy};
use crate::pagination::{Page, PageRequest};
use crate::repository::{AuthorRepository, BookRepository};
use crate::store::EntityStore;
use crate::strategy::CacheStrategy;
use std::sync::Arc;

/// Read/write entry point for authors and books.
///
/// # Example
///
/// ```ignore
/// use library_cache::{LibraryConfig, LibraryService, CacheStrategy};
/// use library_cache::store::InMemoryStore;
///
/// let service = LibraryService::in_memory(InMemoryStore::seeded(), LibraryConfig::default())?;
///
/// // `GET /books/memory-cache?pageNumber=1&pageSize=5`
/// let page = service.page(Some(1), Some(5))?;
/// let books = service.list_books(&page, CacheStrategy::Refresh).await?;
/// ```
pub struct LibraryService<S: EntityStore, B: CacheBackend> {
    cache: Arc<CacheExpander<B>>,
    authors: AuthorRepository<S>,
    books: BookRepository<S>,
    mutations: MutationHandler<S, B>,
    config: Arc<LibraryConfig>,
}

impl<S: EntityStore> LibraryService<S, InMemoryBackend> {
    /// Service backed by an in-memory cache sized by `config.cache_capacity`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `config` fails [`LibraryConfig::validate`].
    pub fn in_memory(store: S, config: LibraryConfig) -> Result<Self> {
        config.validate()?;
        let backend = match config.cache_capacity {
            Some(capacity) => InMemoryBackend::with_capacity(capacity),
            None => InMemoryBackend::new(),
        };
        Self::new(store, backend, config)
    }
}

impl<S: EntityStore, B: CacheBackend> LibraryService<S, B> {
    /// Create a service over the given store and cache backend.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `config` fails [`LibraryConfig::validate`].
    pub fn new(store: S, backend: B, config: LibraryConfig) -> Result<Self> {
        config.validate()?;
        let cache = CacheExpander::new(backend)
            .with_ttl_policy(TtlPolicy::Fixed(config.cache_ttl()))
            .with_default_priority(config.default_priority);
        Ok(Self::from_parts(Arc::new(store), cache, config))
    }

    /// Create a service with a custom metrics handler.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `config` fails [`LibraryConfig::validate`].
    pub fn with_metrics(
        store: S,
        backend: B,
        config: LibraryConfig,
        metrics: Box<dyn CacheMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = CacheExpander::new(backend)
            .with_ttl_policy(TtlPolicy::Fixed(config.cache_ttl()))
            .with_default_priority(config.default_priority)
            .with_metrics(metrics);
        Ok(Self::from_parts(Arc::new(store), cache, config))
    }

    fn from_parts(store: Arc<S>, cache: CacheExpander<B>, config: LibraryConfig) -> Self {
        let cache = Arc::new(cache);
        LibraryService {
            authors: AuthorRepository::new(Arc::clone(&store)),
            books: BookRepository::new(Arc::clone(&store)),
            mutations: MutationHandler::new(store, Arc::clone(&cache)),
            cache,
            config: Arc::new(config),
        }
    }

    /// Build a page request from raw query parameters, applying the
    /// configured default page size.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for out-of-range parameters.
    pub fn page(&self, page_number: Option<i64>, page_size: Option<i64>) -> Result<PageRequest> {
        PageRequest::with_default_size(page_number, page_size, self.config.default_page_size)
    }

    /// One page of authors, each with its books.
    ///
    /// `CacheStrategy::Refresh` is the read-through path; `Bypass` reads the
    /// store directly.
    ///
    /// # Errors
    /// Returns `Err` if the store or the cache backend fails.
    pub async fn list_authors(
        &self,
        page: &PageRequest,
        strategy: CacheStrategy,
    ) -> Result<Page<AuthorDto>> {
        self.cache.fetch_page(&self.authors, page, strategy).await
    }

    /// One page of books, each with its author's name.
    ///
    /// # Errors
    /// Returns `Err` if the store or the cache backend fails.
    pub async fn list_books(
        &self,
        page: &PageRequest,
        strategy: CacheStrategy,
    ) -> Result<Page<BookDto>> {
        self.cache.fetch_page(&self.books, page, strategy).await
    }

    pub async fn get_author(&self, id: u64) -> Result<AuthorDto> {
        self.mutations.find_author(id).await
    }

    pub async fn get_book(&self, id: u64) -> Result<BookDto> {
        self.mutations.find_book(id).await
    }

    pub async fn create_author(&self, draft: &NewAuthor) -> Result<AuthorDto> {
        self.mutations.create_author(draft).await
    }

    pub async fn update_author(&self, id: u64, draft: &NewAuthor) -> Result<AuthorDto> {
        self.mutations.update_author(id, draft).await
    }

    pub async fn delete_author(&self, id: u64) -> Result<()> {
        self.mutations.delete_author(id).await
    }

    pub async fn create_book(&self, draft: &NewBook) -> Result<BookDto> {
        self.mutations.create_book(draft).await
    }

    pub async fn update_book(&self, id: u64, draft: &NewBook) -> Result<BookDto> {
        self.mutations.update_book(id, draft).await
    }

    pub async fn delete_book(&self, id: u64) -> Result<()> {
        self.mutations.delete_book(id).await
    }

    /// Get a reference to the underlying cache layer.
    pub fn cache(&self) -> &CacheExpander<B> {
        &self.cache
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }
}

impl<S: EntityStore, B: CacheBackend> Clone for LibraryService<S, B> {
    fn clone(&self) -> Self {
        LibraryService {
            cache: Arc::clone(&self.cache),
            authors: self.authors.clone(),
            books: self.books.clone(),
            mutations: self.mutations.clone(),
            config: Arc::clone(&self.config),
        }
    }
}
