//! Property-based tests for paginated reads and cache keys.
//!
//! # Properties Tested
//!
//! 1. **Coverage Property**: concatenating pages 1..=ceil(total/size) yields
//!    every live record exactly once, in ascending id order
//! 2. **Transparency Property**: a cached read returns the same page as a
//!    direct store read
//! 3. **Key Property**: distinct (kind, page, size) never share a cache key

use library_cache::key::CacheKeyBuilder;
use library_cache::model::{EntityKind, NewAuthor, NewBook};
use library_cache::store::{EntityStore, InMemoryStore};
use library_cache::{CacheStrategy, LibraryConfig, LibraryService, PageRequest};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime")
}

/// Store with `authors` authors and `books` books assigned round-robin, then
/// the books at `deleted` positions removed.
async fn build_store(authors: u64, books: u64, deleted: &[u64]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for a in 1..=authors {
        store
            .insert_author(&NewAuthor::new(format!("Author {}", a)))
            .await
            .expect("Failed to insert author");
    }
    for b in 1..=books {
        let author_id = (b % authors) + 1;
        store
            .insert_book(&NewBook::new(format!("Book {}", b), author_id))
            .await
            .expect("Failed to insert book");
    }
    for id in deleted {
        store.delete_book(*id).await.expect("Failed to delete");
    }
    store
}

fn arb_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![Just(EntityKind::Authors), Just(EntityKind::Books)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_pages_cover_books_once_in_order(
        authors in 1u64..6,
        books in 0u64..40,
        page_size in 1u32..12,
        deleted in prop::collection::vec(1u64..40, 0..8),
    ) {
        let rt = runtime();
        let (collected, expected, total) = rt.block_on(async {
            let store = build_store(authors, books, &deleted).await;
            let expected: Vec<u64> = store
                .scan_books(0, usize::MAX)
                .await
                .unwrap()
                .iter()
                .map(|b| b.id)
                .collect();

            let service = LibraryService::in_memory(store, LibraryConfig::default()).unwrap();
            let total = expected.len() as u64;
            let pages = total.div_ceil(page_size as u64).max(1) as u32;

            let mut collected = Vec::new();
            for n in 1..=pages {
                let page = PageRequest::new(n, page_size).unwrap();
                let result = service.list_books(&page, CacheStrategy::Refresh).await.unwrap();
                assert_eq!(result.total_count, total);
                collected.extend(result.data.iter().map(|b| b.id));
            }

            let past_end = PageRequest::new(pages + 1, page_size).unwrap();
            let tail = service.list_books(&past_end, CacheStrategy::Refresh).await.unwrap();
            assert!(tail.data.is_empty());

            (collected, expected, total)
        });

        prop_assert_eq!(collected.len() as u64, total);
        prop_assert_eq!(collected, expected);
    }

    #[test]
    fn prop_cached_page_matches_store_read(
        authors in 1u64..6,
        books in 0u64..30,
        page_number in 1u32..6,
        page_size in 1u32..8,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = build_store(authors, books, &[]).await;
            let service = LibraryService::in_memory(store, LibraryConfig::default()).unwrap();
            let page = PageRequest::new(page_number, page_size).unwrap();

            let direct = service.list_authors(&page, CacheStrategy::Bypass).await.unwrap();
            let miss = service.list_authors(&page, CacheStrategy::Refresh).await.unwrap();
            let hit = service.list_authors(&page, CacheStrategy::Refresh).await.unwrap();

            assert_eq!(direct, miss);
            assert_eq!(miss, hit);
        });
    }

    #[test]
    fn prop_page_keys_never_collide(
        a in (arb_kind(), 1u32..10_000, 1u32..1_000),
        b in (arb_kind(), 1u32..10_000, 1u32..1_000),
    ) {
        let key_a = CacheKeyBuilder::page_key(a.0, &PageRequest::new(a.1, a.2).unwrap());
        let key_b = CacheKeyBuilder::page_key(b.0, &PageRequest::new(b.1, b.2).unwrap());

        prop_assert_eq!(key_a == key_b, a == b);
        prop_assert_eq!(CacheKeyBuilder::parse(&key_a), Some(a));
    }

    #[test]
    fn prop_page_key_starts_with_its_kind_prefix(
        kind in arb_kind(),
        n in 1u32..10_000,
        s in 1u32..1_000,
    ) {
        let key = CacheKeyBuilder::page_key(kind, &PageRequest::new(n, s).unwrap());
        prop_assert!(key.starts_with(&CacheKeyBuilder::kind_prefix(kind)));

        let other = match kind {
            EntityKind::Authors => EntityKind::Books,
            EntityKind::Books => EntityKind::Authors,
        };
        prop_assert!(!key.starts_with(&CacheKeyBuilder::kind_prefix(other)));
    }
}
