//! Performance benchmarks for library-cache
//!
//! This benchmark suite measures:
//! - InMemory backend operations (set, get, delete_prefix)
//! - Page reads through the cache (hit, miss, bypass)
//! - Envelope serialization across page sizes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use library_cache::backend::{CacheBackend, EntryOptions, InMemoryBackend};
use library_cache::model::{BookDto, EntityKind, NewAuthor, NewBook};
use library_cache::serialization::{deserialize_from_cache, serialize_for_cache};
use library_cache::store::{EntityStore, InMemoryStore};
use library_cache::{CacheStrategy, LibraryConfig, LibraryService, Page, PageRequest};
use std::hint::black_box;

// ============================================================================
// Benchmark Fixtures
// ============================================================================

/// Store with `books` books spread over 20 authors.
fn bench_store(rt: &tokio::runtime::Runtime, books: u64) -> InMemoryStore {
    let store = InMemoryStore::new();
    rt.block_on(async {
        for a in 1..=20 {
            store
                .insert_author(&NewAuthor::new(format!("Author {}", a)))
                .await
                .expect("Failed to insert author");
        }
        for b in 1..=books {
            store
                .insert_book(&NewBook::new(format!("Book {}", b), (b % 20) + 1))
                .await
                .expect("Failed to insert book");
        }
    });
    store
}

fn book_page(size: u32) -> Page<BookDto> {
    let data = (1..=size as u64)
        .map(|id| BookDto {
            id,
            title: format!("Book {}", id),
            author_id: 1,
            author_name: "Author 1".to_string(),
        })
        .collect();
    Page::new(data, 10_000, &PageRequest::new(1, size).expect("valid page"))
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .set(
                            black_box("books_cache_1_5"),
                            black_box(value.clone()),
                            EntryOptions::default(),
                        )
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .set("books_cache_1_5", vec![1u8; size], EntryOptions::default())
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt)
                    .iter(|| async { backend.get(black_box("books_cache_1_5")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("books_cache_9_9")).await });
    });

    // Measures: repopulate 100 pages of each kind + drop one kind
    group.bench_function("delete_prefix", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt).iter(|| async {
            for n in 1..=100 {
                for kind in EntityKind::all() {
                    backend
                        .set(
                            &format!("{}_cache_{}_5", kind, n),
                            vec![0u8; 64],
                            EntryOptions::default(),
                        )
                        .await
                        .expect("Failed to set");
                }
            }
            backend.delete_prefix(black_box("books_cache_")).await
        });
    });

    group.finish();
}

// ============================================================================
// Group 2: Page Read Benchmarks
// ============================================================================

fn page_read_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_reads");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [5u32, 50, 500].iter() {
        // Measures: cache lookup + deserialization
        group.bench_with_input(BenchmarkId::new("books_hit", size), size, |b, &size| {
            let service =
                LibraryService::in_memory(bench_store(&rt, 1_000), LibraryConfig::default())
                    .expect("Failed to build service");
            let page = PageRequest::new(1, size).expect("valid page");
            rt.block_on(async {
                service
                    .list_books(&page, CacheStrategy::Refresh)
                    .await
                    .expect("Failed to populate cache");
            });

            b.to_async(&rt).iter(|| async {
                service
                    .list_books(black_box(&page), CacheStrategy::Refresh)
                    .await
            });
        });

        // Measures: cache lookup + store scan + join + serialization + cache store
        group.bench_with_input(BenchmarkId::new("books_miss", size), size, |b, &size| {
            let service =
                LibraryService::in_memory(bench_store(&rt, 1_000), LibraryConfig::default())
                    .expect("Failed to build service");
            let page = PageRequest::new(1, size).expect("valid page");

            b.to_async(&rt).iter(|| async {
                service
                    .cache()
                    .invalidate_prefix(EntityKind::Books)
                    .await
                    .expect("Failed to invalidate");
                service
                    .list_books(black_box(&page), CacheStrategy::Refresh)
                    .await
            });
        });

        // Measures: store scan + join only
        group.bench_with_input(BenchmarkId::new("books_bypass", size), size, |b, &size| {
            let service =
                LibraryService::in_memory(bench_store(&rt, 1_000), LibraryConfig::default())
                    .expect("Failed to build service");
            let page = PageRequest::new(1, size).expect("valid page");

            b.to_async(&rt).iter(|| async {
                service
                    .list_books(black_box(&page), CacheStrategy::Bypass)
                    .await
            });
        });
    }

    group.bench_function("authors_hit", |b| {
        let service = LibraryService::in_memory(bench_store(&rt, 1_000), LibraryConfig::default())
            .expect("Failed to build service");
        let page = PageRequest::new(1, 20).expect("valid page");
        rt.block_on(async {
            service
                .list_authors(&page, CacheStrategy::Refresh)
                .await
                .expect("Failed to populate cache");
        });

        b.to_async(&rt).iter(|| async {
            service
                .list_authors(black_box(&page), CacheStrategy::Refresh)
                .await
        });
    });

    group.finish();
}

// ============================================================================
// Group 3: Serialization Benchmarks
// ============================================================================

fn serialization_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    for size in [5u32, 50, 500].iter() {
        let page = book_page(*size);

        group.bench_with_input(BenchmarkId::new("serialize", size), &page, |b, page| {
            b.iter(|| serialize_for_cache(black_box(page)));
        });

        let serialized = serialize_for_cache(&page).expect("Failed to serialize");
        group
            .throughput(Throughput::Bytes(serialized.len() as u64))
            .bench_with_input(
                BenchmarkId::new("deserialize", size),
                &serialized,
                |b, serialized| {
                    b.iter(|| deserialize_from_cache::<Page<BookDto>>(black_box(serialized)));
                },
            );
    }

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(
    benches,
    inmemory_benchmarks,
    page_read_benchmarks,
    serialization_benchmarks
);
criterion_main!(benches);
