//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum transactions to return per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The page of results a client asked for and how many results exist in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The 1-based page number.
    pub page: u64,
    /// The number of results per page.
    pub limit: u64,
    /// The number of results across all pages.
    pub total: u64,
    /// The number of pages needed to show every result.
    pub pages: u64,
}

impl Pagination {
    /// Resolve the requested page and page size against `config`.
    ///
    /// Missing values fall back to the defaults, a page of zero is treated as
    /// the first page and the page size is clamped to `1..=max_page_size`.
    pub fn new(page: Option<u64>, limit: Option<u64>, total: u64, config: &PaginationConfig) -> Self {
        let page = page.unwrap_or(config.default_page).max(1);
        let limit = limit
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }

    /// The number of results to skip to reach the start of the page.
    ///
    /// Never more than `total`, so a page past the end skips everything.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(self.total)
    }
}
