//! Store records, mutation drafts and the DTO projections served to callers.
//!
//! Records are what the entity store owns. DTOs are what the repositories
//! produce and what the cache layer stores; raw records never enter the cache.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two entity kinds the service exposes.
///
/// Used to namespace cache keys and to scope invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Authors,
    Books,
}

impl EntityKind {
    /// Stable lowercase name, used as the cache key namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Authors => "authors",
            EntityKind::Books => "books",
        }
    }

    pub fn all() -> [EntityKind; 2] {
        [EntityKind::Authors, EntityKind::Books]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Store records
// ============================================================================

/// Author record as held by the entity store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

/// Book record as held by the entity store.
///
/// `author_id` must resolve to a live author whenever the book is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author_id: u64,
}

// ============================================================================
// Mutation drafts
// ============================================================================

/// Input for creating or replacing an author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
}

impl NewAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        NewAuthor { name: name.into() }
    }

    /// Reject an empty or whitespace-only name.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)
    }
}

/// Input for creating or replacing a book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author_id: u64,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author_id: u64) -> Self {
        NewBook {
            title: title.into(),
            author_id,
        }
    }

    /// Reject an empty or whitespace-only title.
    ///
    /// The author reference is checked separately against the store.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("title", &self.title)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

// ============================================================================
// DTO projections
// ============================================================================

/// Book as nested under its author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummaryDto {
    pub id: u64,
    pub title: String,
}

impl From<&Book> for BookSummaryDto {
    fn from(book: &Book) -> Self {
        BookSummaryDto {
            id: book.id,
            title: book.title.clone(),
        }
    }
}

/// Author with its own books, ordered by book id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: u64,
    pub name: String,
    pub books: Vec<BookSummaryDto>,
}

impl AuthorDto {
    pub fn project(author: &Author, books: &[Book]) -> Self {
        AuthorDto {
            id: author.id,
            name: author.name.clone(),
            books: books.iter().map(BookSummaryDto::from).collect(),
        }
    }
}

/// Book with its author's name joined inline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: u64,
    pub title: String,
    pub author_id: u64,
    pub author_name: String,
}

impl BookDto {
    pub fn project(book: &Book, author_name: impl Into<String>) -> Self {
        BookDto {
            id: book.id,
            title: book.title.clone(),
            author_id: book.author_id,
            author_name: author_name.into(),
        }
    }
}
