//! Pagination and search parameters shared by the listing endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::input::{like_pattern, optional_trimmed};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Query string accepted by paginated listings: `?q=&page=&limit=`.
///
/// `limit` has no universal default; each route supplies its own through
/// [`ListQuery::window`].
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListQuery {
    /// Case-insensitive substring filter. Blank means no filter.
    #[serde(default, deserialize_with = "optional_trimmed")]
    #[validate(length(max = 100, message = "q must be at most 100 characters"))]
    pub q: Option<String>,

    #[validate(range(min = 1, message = "page must be greater than or equal to 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Resolve page/limit, falling back to page 1 and the route's default size.
    pub fn window(&self, default_limit: u32) -> PageWindow {
        PageWindow::new(self.page.unwrap_or(1), self.limit.unwrap_or(default_limit))
    }

    /// `ILIKE` pattern for the search text, if any.
    pub fn pattern(&self) -> Option<String> {
        self.q.as_deref().map(like_pattern)
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta::new(self.page, self.limit, total)
    }
}

/// `meta` block of every paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    /// `ceil(total / limit)`; zero when nothing matched.
    pub pages: i64,
}

impl PageMeta {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_wide = i64::from(limit.max(1));
        let total = total.max(0);
        Self {
            page,
            limit,
            total,
            pages: (total + limit_wide - 1) / limit_wide,
        }
    }
}

/// `{ "data": [...], "meta": {...} }`
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            data,
            meta: window.meta(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rows a page holds for a given total: `min(limit, total - offset)` clamped at zero.
    fn expected_len(total: i64, window: PageWindow) -> i64 {
        (total - window.offset()).clamp(0, window.limit())
    }

    #[test]
    fn pages_is_ceiling_of_total_over_limit() {
        for total in [0_i64, 1, 9, 10, 11, 99, 100, 101, 1234] {
            for limit in [1_u32, 3, 10, 12, 20, 100] {
                let meta = PageMeta::new(1, limit, total);
                let expected = (total as f64 / f64::from(limit)).ceil() as i64;
                assert_eq!(meta.pages, expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn offset_follows_page_and_limit() {
        assert_eq!(PageWindow::new(1, 12).offset(), 0);
        assert_eq!(PageWindow::new(2, 12).offset(), 12);
        assert_eq!(PageWindow::new(5, 20).offset(), 80);
    }

    #[test]
    fn slice_length_never_exceeds_remaining_rows() {
        let total = 25;
        assert_eq!(expected_len(total, PageWindow::new(1, 10)), 10);
        assert_eq!(expected_len(total, PageWindow::new(3, 10)), 5);
        assert_eq!(expected_len(total, PageWindow::new(4, 10)), 0);
    }

    #[test]
    fn window_uses_route_default_limit() {
        let query = ListQuery::default();
        assert_eq!(query.window(12), PageWindow { page: 1, limit: 12 });
        assert_eq!(query.window(20), PageWindow { page: 1, limit: 20 });

        let query = ListQuery {
            page: Some(3),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(query.window(12), PageWindow { page: 3, limit: 5 });
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let zero_page = ListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(zero_page.validate().is_err());

        let huge_limit = ListQuery {
            limit: Some(101),
            ..Default::default()
        };
        assert!(huge_limit.validate().is_err());

        let long_q = ListQuery {
            q: Some("x".repeat(101)),
            ..Default::default()
        };
        assert!(long_q.validate().is_err());
    }

    #[test]
    fn query_string_parses_and_blank_q_is_ignored() {
        let query: ListQuery = serde_urlencoded_from("q=++&page=2&limit=10");
        assert_eq!(query.q, None);
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.pattern(), None);
    }

    fn serde_urlencoded_from(qs: &str) -> ListQuery {
        use axum::extract::Query;
        let uri: axum::http::Uri = format!("/x?{qs}").parse().unwrap();
        Query::<ListQuery>::try_from_uri(&uri).unwrap().0
    }
}
