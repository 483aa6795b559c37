//! Data models shared across storage backends and service APIs.

use serde::Serialize;

/// Navigation data for 1-based paginated listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub next_page: i64,
    pub previous_page: i64,
    pub last_page: i64,
    /// Total number of records matching the query.
    pub total_items: i64,
}

impl Pagination {
    /// Derives navigation data from a 1-based page number, a page size, and
    /// the total record count. An empty result set still has one page. The
    /// arithmetic saturates so an untrusted page number cannot overflow.
    pub fn new(current_page: i64, per_page: i64, total_items: i64) -> Self {
        let per_page = per_page.max(1);
        let last_page = if total_items == 0 {
            1
        } else {
            (total_items + per_page - 1) / per_page
        };
        Self {
            current_page,
            has_next_page: per_page.saturating_mul(current_page) < total_items,
            has_previous_page: current_page > 1,
            next_page: current_page.saturating_add(1),
            previous_page: current_page - 1,
            last_page,
            total_items,
        }
    }
}

/// One page of records plus its navigation data.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_has_both_neighbours() {
        let p = Pagination::new(2, 3, 7);
        assert!(p.has_previous_page);
        assert!(p.has_next_page);
        assert_eq!(p.previous_page, 1);
        assert_eq!(p.next_page, 3);
        assert_eq!(p.last_page, 3);
    }

    #[test]
    fn first_page_has_no_previous() {
        let p = Pagination::new(1, 3, 7);
        assert!(!p.has_previous_page);
        assert!(p.has_next_page);
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination::new(3, 3, 7);
        assert!(p.has_previous_page);
        assert!(!p.has_next_page);
        assert_eq!(p.last_page, 3);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let p = Pagination::new(2, 3, 6);
        assert!(!p.has_next_page);
        assert_eq!(p.last_page, 2);
    }

    #[test]
    fn empty_listing_is_a_single_page() {
        let p = Pagination::new(1, 3, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_previous_page);
        assert_eq!(p.last_page, 1);
    }

    #[test]
    fn extreme_page_numbers_do_not_wrap() {
        let p = Pagination::new(i64::MAX, 3, 7);
        assert!(!p.has_next_page);
        assert!(p.has_previous_page);
        assert_eq!(p.next_page, i64::MAX);
        assert_eq!(p.last_page, 3);
    }
}
