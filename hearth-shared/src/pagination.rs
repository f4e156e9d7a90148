/// Page/limit handling shared by every list endpoint
///
/// Clients send 1-based `page` and `limit` query parameters; responses carry
/// a [`Pagination`] block with the total item count and `pages`, which is
/// always `ceil(total / limit)`.

use serde::{Deserialize, Serialize};

/// Page size used when the client does not send `limit`
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 100;

/// Requested page, as read from the query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// 1-based page number, never below 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip for `OFFSET`
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Pagination block returned alongside list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: &PageRequest, total: i64) -> Self {
        let limit = request.limit();
        Self {
            page: request.page(),
            limit,
            total,
            pages: page_count(total, limit),
        }
    }
}

/// `ceil(total / limit)`; zero when there is nothing to show
pub fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// One page of rows plus its pagination block
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_is_ceiling() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(95, 20), 5);
        assert_eq!(page_count(100, 1), 100);
    }

    #[test]
    fn test_page_count_matches_float_ceiling() {
        for total in 0..200i64 {
            for limit in 1..=25i64 {
                let expected = (total as f64 / limit as f64).ceil() as i64;
                assert_eq!(page_count(total, limit), expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn test_defaults_and_clamping() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(0, 500);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), MAX_LIMIT);

        let request = PageRequest::new(-3, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_pagination_block() {
        let pagination = Pagination::new(&PageRequest::new(2, 10), 25);
        assert_eq!(
            pagination,
            Pagination {
                page: 2,
                limit: 10,
                total: 25,
                pages: 3
            }
        );
    }
}
