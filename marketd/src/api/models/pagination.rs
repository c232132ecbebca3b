//! Shared pagination types for API query parameters.
//!
//! Collection endpoints (articles, products) use offset pagination with
//! `page`/`page_size`; comment listings use keyset cursor pagination so the
//! cost of a page stays independent of how deep the client has paged.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum number of items per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Offset pagination parameters for list endpoints.
///
/// `page` is 1-based; `page_size` is clamped to 1..=100 to prevent both
/// zero-result queries and excessive fetches.
// DisplayFromStr: these params are deserialized through a flattening
// wrapper, where query values arrive as strings.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct OffsetPagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Items per page (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page_size: Option<i64>,
}

impl OffsetPagination {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows to skip for the requested page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

/// Generic offset-paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedList<T: ToSchema> {
    /// The items for the current page
    pub list: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
}

/// Default limit for cursor-based pagination.
pub const DEFAULT_CURSOR_LIMIT: i64 = 10;

/// Maximum limit for cursor-based pagination.
pub const MAX_CURSOR_LIMIT: i64 = 100;

/// Cursor pagination parameters for comment listings.
///
/// `cursor` is the id of the last item of the previous page; the next page
/// starts strictly after it.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CursorPagination {
    /// Opaque cursor marking the boundary of the last-seen page
    pub cursor: Option<Uuid>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl CursorPagination {
    /// Get the limit value, clamped between 1 and MAX_CURSOR_LIMIT.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_CURSOR_LIMIT).clamp(1, MAX_CURSOR_LIMIT)
    }
}

/// Generic cursor-paginated response. `next_cursor` is null on the final
/// page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CursorPage<T: ToSchema> {
    pub list: Vec<T>,
    pub next_cursor: Option<Uuid>,
}

/// Split a `limit + 1`-row probe into the returned page and its cursor.
///
/// The extra row only proves more data exists; the cursor handed out is the
/// id of the last *returned* row, so the next fetch resumes strictly after
/// it and every row is visited exactly once across pages.
pub fn split_cursor_page<T>(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> (Vec<T>, Option<Uuid>) {
    if rows.len() as i64 > limit {
        rows.truncate(limit.max(0) as usize);
        let next_cursor = rows.last().map(id_of);
        (rows, next_cursor)
    } else {
        (rows, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_defaults_and_clamping() {
        let p = OffsetPagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.skip(), 0);

        let p = OffsetPagination {
            page: Some(-3),
            page_size: Some(1000),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), MAX_PAGE_SIZE);

        let p = OffsetPagination {
            page: Some(3),
            page_size: Some(20),
        };
        assert_eq!(p.skip(), 40);
    }

    #[test]
    fn test_cursor_limit_clamping() {
        let p = CursorPagination::default();
        assert_eq!(p.limit(), DEFAULT_CURSOR_LIMIT);

        let p = CursorPagination {
            cursor: None,
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);

        let p = CursorPagination {
            cursor: None,
            limit: Some(1000),
        };
        assert_eq!(p.limit(), MAX_CURSOR_LIMIT);
    }

    #[test]
    fn test_split_cursor_page() {
        let ids: Vec<Uuid> = (0..11).map(|_| Uuid::now_v7()).collect();

        // Full probe: 11 rows at limit 10 -> 10 returned, cursor = 10th id.
        let (page, next) = split_cursor_page(ids.clone(), 10, |id| *id);
        assert_eq!(page.len(), 10);
        assert_eq!(next, Some(ids[9]));

        // Short page: no further data, cursor is null.
        let (page, next) = split_cursor_page(ids[..5].to_vec(), 10, |id| *id);
        assert_eq!(page.len(), 5);
        assert_eq!(next, None);

        // Exactly limit rows: also the final page.
        let (page, next) = split_cursor_page(ids[..10].to_vec(), 10, |id| *id);
        assert_eq!(page.len(), 10);
        assert_eq!(next, None);
    }
}
