//! Offset and cursor pagination.
//!
//! Parameters out of range are clamped rather than rejected:
//!
//! - a page number below 1 becomes 1;
//! - a page size (or cursor limit) of 0 or above `max_page_size` becomes
//!   `default_page_size`.
//!
//! Cursor tokens are opaque to callers. Internally they are URL-safe base64
//! over a small JSON document holding the resume offset.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ListDataError, Result};

/// Page size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_page_size: 100,
            max_page_size: 100,
        }
    }
}

/// How the caller wants the result set sliced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationRequest {
    /// 1-based page number and page size.
    Offset {
        #[serde(default)]
        page: i64,
        #[serde(default)]
        page_size: i64,
    },
    /// Resume token (absent for the first page) and page limit.
    Cursor {
        #[serde(default)]
        cursor: Option<String>,
        #[serde(default)]
        limit: i64,
    },
}

impl PaginationRequest {
    pub fn offset(page: i64, page_size: i64) -> Self {
        PaginationRequest::Offset { page, page_size }
    }

    pub fn cursor(cursor: Option<String>, limit: i64) -> Self {
        PaginationRequest::Cursor { cursor, limit }
    }
}

/// Pagination metadata returned with every result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResponse {
    /// Items available before pagination.
    pub total_items: usize,
    /// Current page (offset mode only).
    pub current_page: Option<usize>,
    /// Effective page size after clamping.
    pub page_size: usize,
    /// `ceil(total_items / page_size)`.
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
    /// Token for the next page (cursor mode, when more items remain).
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorToken {
    offset: usize,
}

/// Encodes a resume offset as an opaque cursor token.
pub fn encode_cursor(offset: usize) -> String {
    // A struct with a single usize always serializes.
    let json = serde_json::to_vec(&CursorToken { offset }).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a cursor token back into a resume offset.
pub fn decode_cursor(token: &str) -> Result<usize> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| ListDataError::InvalidCursor(e.to_string()))?;
    let decoded: CursorToken =
        serde_json::from_slice(&bytes).map_err(|e| ListDataError::InvalidCursor(e.to_string()))?;
    Ok(decoded.offset)
}

/// Slices result sets; holds only its size limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Paginator { config }
    }

    pub fn config(&self) -> PaginationConfig {
        self.config
    }

    /// Clamps a requested page size.
    pub fn effective_size(&self, requested: i64) -> usize {
        match usize::try_from(requested) {
            Ok(size) if size > 0 && size <= self.config.max_page_size => size,
            _ => self.config.default_page_size.max(1),
        }
    }

    /// Slices `items` according to `request`.
    ///
    /// `None` returns everything as a single page.
    pub fn paginate<T>(
        &self,
        items: Vec<T>,
        request: Option<&PaginationRequest>,
    ) -> Result<(Vec<T>, PaginationResponse)> {
        match request {
            None => Ok(Self::single_page(items)),
            Some(PaginationRequest::Offset { page, page_size }) => {
                Ok(self.by_offset(items, *page, *page_size))
            }
            Some(PaginationRequest::Cursor { cursor, limit }) => {
                self.by_cursor(items, cursor.as_deref(), *limit)
            }
        }
    }

    fn single_page<T>(items: Vec<T>) -> (Vec<T>, PaginationResponse) {
        let total = items.len();
        let response = PaginationResponse {
            total_items: total,
            current_page: Some(1),
            page_size: total,
            total_pages: usize::from(total > 0),
            has_next: false,
            has_prev: false,
            next_cursor: None,
        };
        (items, response)
    }

    fn by_offset<T>(
        &self,
        items: Vec<T>,
        page: i64,
        page_size: i64,
    ) -> (Vec<T>, PaginationResponse) {
        let size = self.effective_size(page_size);
        let page = usize::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let total = items.len();
        let total_pages = total.div_ceil(size);
        let start = (page - 1).saturating_mul(size);

        let response = PaginationResponse {
            total_items: total,
            current_page: Some(page),
            page_size: size,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total > 0,
            next_cursor: None,
        };
        (take_window(items, start, size), response)
    }

    fn by_cursor<T>(
        &self,
        items: Vec<T>,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<(Vec<T>, PaginationResponse)> {
        let size = self.effective_size(limit);
        let start = match cursor.filter(|c| !c.trim().is_empty()) {
            Some(token) => decode_cursor(token)?,
            None => 0,
        };
        let total = items.len();
        let end = start.saturating_add(size);
        let has_next = end < total;

        let response = PaginationResponse {
            total_items: total,
            current_page: None,
            page_size: size,
            total_pages: total.div_ceil(size),
            has_next,
            has_prev: start > 0 && total > 0,
            next_cursor: has_next.then(|| encode_cursor(end)),
        };
        Ok((take_window(items, start, size), response))
    }
}

fn take_window<T>(items: Vec<T>, start: usize, size: usize) -> Vec<T> {
    if start >= items.len() {
        return Vec::new();
    }
    items.into_iter().skip(start).take(size).collect()
}
