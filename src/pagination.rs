//! Page requests and paginated result sets.
//!
//! Pagination parameters are validated, never clamped: a page number or page
//! size below 1 is a [`Error::ValidationError`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Page number used when the caller does not supply one.
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// A validated (page number, page size) pair. Page numbers start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a page request.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` if `page_number < 1`, `page_size < 1`
    /// or `page_size > MAX_PAGE_SIZE`.
    pub fn new(page_number: u32, page_size: u32) -> Result<Self> {
        if page_number < 1 {
            return Err(Error::validation("pageNumber must be at least 1"));
        }
        if page_size < 1 {
            return Err(Error::validation("pageSize must be at least 1"));
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(Error::validation(format!(
                "pageSize must be at most {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(PageRequest {
            page_number,
            page_size,
        })
    }

    /// Apply defaults for absent parameters, then validate.
    ///
    /// Signed input so that a negative query value is reported instead of
    /// wrapping.
    pub fn from_query(page_number: Option<i64>, page_size: Option<i64>) -> Result<Self> {
        let page_number = page_number.unwrap_or(DEFAULT_PAGE_NUMBER as i64);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);

        let page_number = u32::try_from(page_number)
            .map_err(|_| Error::validation("pageNumber must be at least 1"))?;
        let page_size = u32::try_from(page_size)
            .map_err(|_| Error::validation("pageSize must be at least 1"))?;

        Self::new(page_number, page_size)
    }

    /// Same as [`PageRequest::from_query`] with a configured default size.
    pub fn with_default_size(
        page_number: Option<i64>,
        page_size: Option<i64>,
        default_size: u32,
    ) -> Result<Self> {
        Self::from_query(page_number, page_size.or(Some(default_size as i64)))
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of records to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.page_number as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Number of records to take.
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the size of the whole collection.
///
/// Serialized as `{ data, totalCount, pageNumber, pageSize }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total_count: u64, request: &PageRequest) -> Self {
        Page {
            data,
            total_count,
            page_number: request.page_number(),
            page_size: request.page_size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Slice one page out of an id-ordered sequence.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(request.offset())
        .take(request.limit())
        .collect()
}
