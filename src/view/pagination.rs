use std::ops::RangeInclusive;

/// Page position within a listing, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pagination {
    /// `ceil(total / page_size)`; zero for an empty listing or a zero page size.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether `page` may be requested.
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages()
    }

    pub fn next(&self) -> Option<u32> {
        let next = self.page.checked_add(1)?;
        self.contains(next).then_some(next)
    }

    pub fn prev(&self) -> Option<u32> {
        let prev = self.page.checked_sub(1)?;
        self.contains(prev).then_some(prev)
    }

    /// Up to `width` page numbers centred on the current page, for a pager.
    pub fn window(&self, width: u32) -> RangeInclusive<u32> {
        let last = self.total_pages();
        if last == 0 || width == 0 {
            return 1..=0;
        }
        let width = width.min(last);
        let current = self.page.clamp(1, last);
        let start = current
            .saturating_sub(width / 2)
            .max(1)
            .min(last - width + 1);
        start..=start + width - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(page: u32, total: u64) -> Pagination {
        Pagination {
            page,
            page_size: 20,
            total,
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(at(1, 45).total_pages(), 3);
        assert_eq!(at(1, 40).total_pages(), 2);
        assert_eq!(at(1, 1).total_pages(), 1);
        assert_eq!(at(1, 0).total_pages(), 0);
    }

    #[test]
    fn test_zero_page_size_has_no_pages() {
        let p = Pagination {
            page: 1,
            page_size: 0,
            total: 10,
        };
        assert_eq!(p.total_pages(), 0);
        assert!(!p.contains(1));
    }

    #[test]
    fn test_contains_only_valid_pages() {
        let p = at(1, 45);
        assert!(!p.contains(0));
        assert!(p.contains(1));
        assert!(p.contains(3));
        assert!(!p.contains(4));
    }

    #[test]
    fn test_next_and_prev_stop_at_edges() {
        assert_eq!(at(1, 45).prev(), None);
        assert_eq!(at(1, 45).next(), Some(2));
        assert_eq!(at(3, 45).next(), None);
        assert_eq!(at(3, 45).prev(), Some(2));
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(at(1, 45).window(5), 1..=3);
        assert_eq!(at(5, 200).window(5), 3..=7);
        assert_eq!(at(1, 200).window(5), 1..=5);
        assert_eq!(at(10, 200).window(5), 6..=10);
        assert!(at(1, 0).window(5).is_empty());
    }
}
