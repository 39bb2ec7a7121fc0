// src/pagination.rs

use serde::{Deserialize, Serialize};

/// Default page size when the client sends none.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Generic pagination parameters (`?page=&size=`), 0-based.
///
/// Extracted alongside endpoint-specific query structs; values are clamped
/// by the accessors rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for `LIMIT`/`OFFSET` queries.
    pub fn offset(&self) -> i64 {
        self.page() * self.size()
    }
}

/// Standard pagination envelope:
/// `{content, totalElements, totalPages, page, size, first, last}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub page: i64,
    pub size: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: i64, params: &PageParams) -> Self {
        let page = params.page();
        let size = params.size();
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };

        Page {
            content,
            total_elements,
            total_pages,
            page,
            size,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, size: Option<i64>) -> PageParams {
        PageParams { page, size }
    }

    #[test]
    fn defaults_and_clamping() {
        let p = params(None, None);
        assert_eq!(p.page(), 0);
        assert_eq!(p.size(), DEFAULT_PAGE_SIZE);

        assert_eq!(params(Some(-3), Some(0)).page(), 0);
        assert_eq!(params(Some(-3), Some(0)).size(), 1);
        assert_eq!(params(None, Some(10_000)).size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_is_page_times_size() {
        assert_eq!(params(Some(3), Some(25)).offset(), 75);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 41, &params(Some(0), Some(20)));
        assert_eq!(page.total_pages, 3);
        assert!(page.first);
        assert!(!page.last);
    }

    #[test]
    fn last_page_flag() {
        let page = Page::new(vec![1], 41, &params(Some(2), Some(20)));
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn empty_result_is_first_and_last() {
        let page = Page::<i64>::new(vec![], 0, &params(None, None));
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
    }
}
