use serde::{Deserialize, Serialize};

/// Default ceiling on rows returned by a single `list` call
pub const DEFAULT_MAX_ROWS_FETCHED: i64 = 50;

/// LIMIT/OFFSET pair derived from caller input and a per-table ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub rows_limit: i64,
    pub rows_offset: i64,
}

impl PageWindow {
    /// Clamp `limit` into `0..=max_rows_fetched` and turn `page_number` into a
    /// non-negative offset.
    pub fn new(limit: i64, page_number: i64, max_rows_fetched: i64) -> Self {
        let ceiling = max_rows_fetched.max(0);
        let rows_limit = limit.clamp(0, ceiling);
        let rows_offset = page_number.max(0).saturating_mul(rows_limit);

        Self {
            rows_limit,
            rows_offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows_limit == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped_to_ceiling() {
        let window = PageWindow::new(10_000, 2, DEFAULT_MAX_ROWS_FETCHED);
        assert_eq!(window.rows_limit, 50);
        assert_eq!(window.rows_offset, 100);
    }

    #[test]
    fn test_negative_inputs() {
        let window = PageWindow::new(-5, -3, DEFAULT_MAX_ROWS_FETCHED);
        assert_eq!(window.rows_limit, 0);
        assert_eq!(window.rows_offset, 0);
        assert!(window.is_empty());

        let window = PageWindow::new(20, -1, DEFAULT_MAX_ROWS_FETCHED);
        assert_eq!(window.rows_limit, 20);
        assert_eq!(window.rows_offset, 0);
    }

    #[test]
    fn test_offset_saturates() {
        let window = PageWindow::new(50, i64::MAX, DEFAULT_MAX_ROWS_FETCHED);
        assert_eq!(window.rows_offset, i64::MAX);
    }

    #[test]
    fn test_window_bounds_hold_for_any_input() {
        let samples = [i64::MIN, -100, -1, 0, 1, 7, 49, 50, 51, 1000, i64::MAX];
        for limit in samples {
            for page in samples {
                let window = PageWindow::new(limit, page, DEFAULT_MAX_ROWS_FETCHED);
                assert!(window.rows_limit >= 0 && window.rows_limit <= DEFAULT_MAX_ROWS_FETCHED);
                assert!(window.rows_offset >= 0);
            }
        }
    }
}
