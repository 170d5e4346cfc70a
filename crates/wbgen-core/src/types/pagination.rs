//! Offset pagination for the list endpoints.
//!
//! Requests are clamped on construction so repositories never see a zero
//! page size or a page number below one.

use serde::Serialize;

const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page selector.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u64,
    /// Items per page, `1..=100`.
    pub page_size: u64,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `page_size` to `1..=100`.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.page_size
    }

    /// Row cap for this page.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of items plus the totals a client needs to page further.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Wraps one fetched page. An empty result still reports one page.
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size.max(1)).max(1),
        }
    }
}
