//! Page-number pagination shared by every list operation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;

/// A requested window: `page` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Clamp to `page >= 1` and `1 <= limit <= max_limit`.
    #[must_use]
    pub fn clamped(self, max_limit: u64) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, max_limit.max(1)),
        }
    }

    /// Number of items to skip. Assumes a clamped request.
    #[must_use]
    pub fn offset(self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    #[must_use]
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total_items,
            total_pages,
            has_next_page: request.page < total_pages,
            has_previous_page: request.page > 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            meta: PageMeta::new(request, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let req = PageRequest::new(0, 0).clamped(100);
        assert_eq!(req, PageRequest::new(1, 1));
        let req = PageRequest::new(3, 1_000).clamped(100);
        assert_eq!(req, PageRequest::new(3, 100));
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn meta_reports_neighbours() {
        let meta = PageMeta::new(PageRequest::new(2, 10), 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let meta = PageMeta::new(PageRequest::new(3, 10), 25);
        assert!(!meta.has_next_page);

        let meta = PageMeta::new(PageRequest::new(1, 10), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }
}
