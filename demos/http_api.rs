//! HTTP surface over `LibraryService`.
//!
//! Run with: `cargo run --example http_api`
//!
//! Plain list routes read the store directly; the `/memory-cache` routes go
//! through the page cache. Mutations invalidate cached pages of every kind
//! they affect.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use library_cache::model::{AuthorDto, BookDto, NewAuthor, NewBook};
use library_cache::store::InMemoryStore;
use library_cache::{CacheStrategy, Error, LibraryConfig, LibraryService, Page};
use serde::Deserialize;
use serde_json::json;

type Service = LibraryService<InMemoryStore, library_cache::backend::InMemoryBackend>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page_number: Option<i64>,
    page_size: Option<i64>,
}

/// Library errors rendered as HTTP responses.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match status {
            StatusCode::NOT_FOUND => status.into_response(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("Request failed: {}", self.0);
                (status, Json(json!({ "error": "internal error" }))).into_response()
            }
            _ => (status, Json(json!({ "error": self.0.to_string() }))).into_response(),
        }
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Authors
// ============================================================================

async fn list_authors(
    State(service): State<Service>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<AuthorDto>>> {
    let page = service.page(query.page_number, query.page_size)?;
    Ok(Json(service.list_authors(&page, CacheStrategy::Bypass).await?))
}

async fn list_authors_cached(
    State(service): State<Service>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<AuthorDto>>> {
    let page = service.page(query.page_number, query.page_size)?;
    Ok(Json(
        service.list_authors(&page, CacheStrategy::Refresh).await?,
    ))
}

async fn get_author(
    State(service): State<Service>,
    Path(id): Path<u64>,
) -> ApiResult<Json<AuthorDto>> {
    Ok(Json(service.get_author(id).await?))
}

async fn create_author(
    State(service): State<Service>,
    Json(draft): Json<NewAuthor>,
) -> ApiResult<(StatusCode, Json<AuthorDto>)> {
    let author = service.create_author(&draft).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

async fn update_author(
    State(service): State<Service>,
    Path(id): Path<u64>,
    Json(draft): Json<NewAuthor>,
) -> ApiResult<Json<AuthorDto>> {
    Ok(Json(service.update_author(id, &draft).await?))
}

async fn delete_author(
    State(service): State<Service>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    service.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Books
// ============================================================================

async fn list_books(
    State(service): State<Service>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<BookDto>>> {
    let page = service.page(query.page_number, query.page_size)?;
    Ok(Json(service.list_books(&page, CacheStrategy::Bypass).await?))
}

async fn list_books_cached(
    State(service): State<Service>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<BookDto>>> {
    let page = service.page(query.page_number, query.page_size)?;
    Ok(Json(service.list_books(&page, CacheStrategy::Refresh).await?))
}

async fn get_book(
    State(service): State<Service>,
    Path(id): Path<u64>,
) -> ApiResult<Json<BookDto>> {
    Ok(Json(service.get_book(id).await?))
}

async fn create_book(
    State(service): State<Service>,
    Json(draft): Json<NewBook>,
) -> ApiResult<(StatusCode, Json<BookDto>)> {
    let book = service.create_book(&draft).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<Service>,
    Path(id): Path<u64>,
    Json(draft): Json<NewBook>,
) -> ApiResult<Json<BookDto>> {
    Ok(Json(service.update_book(id, &draft).await?))
}

async fn delete_book(
    State(service): State<Service>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint
async fn health(State(service): State<Service>) -> Json<serde_json::Value> {
    let stats = service.cache().backend().stats().await;
    Json(json!({
        "status": "healthy",
        "service": "library-cache-http-api",
        "version": library_cache::VERSION,
        "cached_pages": stats.total_entries,
    }))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    let config = match LibraryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    log::info!(
        "Starting with page size {}, TTL {}s, capacity {:?}",
        config.default_page_size,
        config.cache_ttl_secs,
        config.cache_capacity
    );

    let service: Service = match LibraryService::in_memory(InMemoryStore::seeded(), config) {
        Ok(service) => service,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/authors", get(list_authors).post(create_author))
        .route("/api/authors/memory-cache", get(list_authors_cached))
        .route(
            "/api/authors/{id}",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/api/books", get(list_books).post(create_book))
        .route("/api/books/memory-cache", get(list_books_cached))
        .route(
            "/api/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind port 3000");

    println!("Server running on http://127.0.0.1:3000");
    println!("Cached books: http://127.0.0.1:3000/api/books/memory-cache?pageNumber=1&pageSize=5");
    println!("Direct books: http://127.0.0.1:3000/api/books?pageNumber=1&pageSize=5");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
