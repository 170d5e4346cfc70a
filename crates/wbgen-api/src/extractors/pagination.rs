//! Query-string pagination parameters.

use serde::Deserialize;

use wbgen_core::types::pagination::PageRequest;

/// Pagination query parameters, e.g. `?page=2&page_size=50`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page, clamped to the server maximum.
    pub page_size: Option<u64>,
}

impl PaginationParams {
    /// Converts into a clamped [`PageRequest`].
    pub fn into_page_request(self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}
