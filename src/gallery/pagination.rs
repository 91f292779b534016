use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub limit: usize,
    pub page_numbers: Vec<usize>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// `base_url` is the folder URL the page links are built on, e.g. `/vacation/`.
    pub fn new(
        base_url: &str,
        current_page: usize,
        limit: usize,
        total_items: usize,
        window: usize,
    ) -> Self {
        let total_pages = total_pages(total_items, limit);
        let page_url = |page: usize| format!("{}?page={}&limit={}", base_url, page, limit);

        Self {
            current_page,
            total_pages,
            limit,
            page_numbers: page_window(current_page, total_pages, window),
            prev_url: (current_page > 1).then(|| page_url(current_page - 1)),
            next_url: (current_page < total_pages).then(|| page_url(current_page + 1)),
        }
    }
}

/// At least one page, even for an empty folder
pub fn total_pages(total_items: usize, limit: usize) -> usize {
    total_items.div_ceil(limit.max(1)).max(1)
}

/// Up to `window` consecutive page numbers around `current`, shifted to stay inside
/// `1..=total_pages`.
pub fn page_window(current: usize, total_pages: usize, window: usize) -> Vec<usize> {
    let window = window.max(1);
    let total_pages = total_pages.max(1);

    let start = current.saturating_sub(window / 2).max(1);
    let end = start.saturating_add(window - 1).min(total_pages);
    let start = (end + 1).saturating_sub(window).max(1);

    (start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_page_window_centres_on_current() {
        assert_eq!(page_window(10, 20, 7), vec![7, 8, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn test_page_window_clamps_at_edges() {
        assert_eq!(page_window(1, 20, 7), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(page_window(2, 20, 7), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(page_window(20, 20, 7), vec![14, 15, 16, 17, 18, 19, 20]);
        assert_eq!(page_window(19, 20, 7), vec![14, 15, 16, 17, 18, 19, 20]);
        assert_eq!(page_window(2, 3, 7), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_beyond_the_end_does_not_overflow() {
        assert_eq!(page_window(usize::MAX, 3, 7), vec![1, 2, 3]);
        assert_eq!(page_window(usize::MAX, 20, 7), vec![14, 15, 16, 17, 18, 19, 20]);

        let pagination = Pagination::new("/", usize::MAX, 20, 5, 7);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.page_numbers, vec![1]);
        assert!(pagination.next_url.is_none());
        assert!(pagination.prev_url.is_some());
    }

    #[test]
    fn test_pagination_links() {
        let pagination = Pagination::new("/vacation/", 2, 10, 35, 7);
        assert_eq!(pagination.total_pages, 4);
        assert_eq!(
            pagination.prev_url.as_deref(),
            Some("/vacation/?page=1&limit=10")
        );
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/vacation/?page=3&limit=10")
        );

        let last = Pagination::new("/", 4, 10, 35, 7);
        assert!(last.next_url.is_none());
        let first = Pagination::new("/", 1, 10, 35, 7);
        assert!(first.prev_url.is_none());
    }
}
