//! Page bookkeeping for collection finders.

use serde::{Deserialize, Serialize};

/// Page size used when a caller asks for a page size below 1.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Largest OFFSET a bigint parameter can carry.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Requested page plus the totals computed after a paginated `all`.
///
/// Invariant after [`Paginator::record`]:
/// `total_pages == ceil(total_entries_size / per_page)`, so `total_pages` is
/// zero exactly when `total_entries_size` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    /// Current page (1-based).
    pub page: u64,
    pub per_page: u64,
    /// Rows skipped before the current page.
    pub offset: u64,
    /// Rows matching the query across all pages.
    pub total_entries_size: u64,
    /// Rows materialized for the current page.
    pub current_entries_size: u64,
    pub total_pages: u64,
}

impl Paginator {
    pub fn new(page: i64, per_page: i64) -> Self {
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let per_page = u64::try_from(per_page)
            .ok()
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PER_PAGE);
        Self {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page).min(MAX_OFFSET),
            total_entries_size: 0,
            current_entries_size: 0,
            total_pages: 0,
        }
    }

    /// Store the totals of an executed page.
    pub fn record(&mut self, total_entries_size: u64, current_entries_size: u64) {
        self.total_entries_size = total_entries_size;
        self.current_entries_size = current_entries_size;
        self.total_pages = total_entries_size.div_ceil(self.per_page);
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE as i64)
    }
}
