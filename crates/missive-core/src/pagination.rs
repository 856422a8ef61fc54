//! Pagination parameters and the metadata block attached to list responses.

use serde::{Deserialize, Serialize};

/// Page used when the query carries no usable `page`.
pub const DEFAULT_PAGE: u32 = 1;

/// Limit used when the query carries no usable `limit`.
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound applied to a requested `limit`.
pub const MAX_LIMIT: u32 = 100;

/// Requested page and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PaginationParams {
    /// Parses `page` and `limit` from a URL query string.
    ///
    /// Missing, unparsable or zero values fall back to the defaults; `limit`
    /// is capped at [`MAX_LIMIT`]. When a key repeats, the first value wins.
    ///
    /// ```
    /// use missive_core::PaginationParams;
    ///
    /// let params = PaginationParams::from_query("page=3&limit=500");
    /// assert_eq!(params.page, 3);
    /// assert_eq!(params.limit, 100);
    /// ```
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<u32>().ok())
                .filter(|v| *v >= 1)
        };

        Self {
            page: first("page").unwrap_or(DEFAULT_PAGE),
            limit: first("limit").unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }

    /// Returns the number of items before this page.
    ///
    /// Computed in `u64`, so any `page`/`limit` pair is representable.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination block serialized under `"pagination"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of items.
    pub total: u64,
    /// Number of pages needed for `total` items.
    pub total_pages: u32,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
    /// The next page, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
    /// The previous page, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u32>,
}

impl PaginationMeta {
    /// Computes the pagination block for `total` items.
    ///
    /// A zero `limit` yields zero pages.
    #[must_use]
    pub fn from_params(params: PaginationParams, total: u64) -> Self {
        let total_pages = if params.limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(params.limit))).unwrap_or(u32::MAX)
        };
        let has_next = params.page < total_pages;
        let has_prev = params.page > 1;

        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
            has_next,
            has_prev,
            next_page: has_next.then(|| params.page + 1),
            prev_page: has_prev.then(|| params.page - 1),
        }
    }
}
