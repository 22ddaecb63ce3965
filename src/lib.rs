//! # library-cache
//!
//! A read-through, paginated cache in front of a two-entity (authors and
//! books) store, with coarse invalidation on every mutation and bounded
//! staleness through absolute TTLs.
//!
//! ## Components
//!
//! - **Entity store** ([`store::EntityStore`]): authoritative records,
//!   ordered paginated scans, atomic cascade delete.
//! - **Repositories** ([`repository`]): store records → pages of DTOs with
//!   explicit joins.
//! - **Cache layer** ([`CacheExpander`]): `get_or_compute`, key construction,
//!   TTL, prefix invalidation.
//! - **Mutation handler** ([`MutationHandler`]): validated writes, then
//!   invalidation of every affected kind.
//! - **Service** ([`LibraryService`]): the explicit, shareable instance
//!   request handlers receive.
//!
//! ## Quick Start
//!
//! ```ignore
//! use library_cache::{CacheStrategy, LibraryConfig, LibraryService};
//! use library_cache::model::NewBook;
//! use library_cache::store::InMemoryStore;
//!
//! let service = LibraryService::in_memory(InMemoryStore::seeded(), LibraryConfig::from_env()?)?;
//!
//! let page = service.page(Some(1), Some(5))?;
//! let first = service.list_books(&page, CacheStrategy::Refresh).await?;  // miss → store
//! let again = service.list_books(&page, CacheStrategy::Refresh).await?;  // hit
//!
//! service.create_book(&NewBook::new("Kindred", 1)).await?;               // drops cached pages
//! let fresh = service.list_books(&page, CacheStrategy::Refresh).await?;  // miss → store
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod error;
pub mod expander;
pub mod key;
pub mod model;
pub mod mutation;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod serialization;
pub mod service;
pub mod store;
pub mod strategy;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use config::LibraryConfig;
pub use error::{Error, Result};
pub use expander::{CacheExpander, OperationConfig};
pub use mutation::MutationHandler;
pub use pagination::{Page, PageRequest};
pub use repository::PagedRepository;
pub use service::LibraryService;
pub use store::EntityStore;
pub use strategy::CacheStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
