//! Pagination state over the remote collection.
//!
//! Total pages derive from the count the API reports and the fixed page
//! size. Pagination controls are hidden whenever a search or filter is
//! active, using the same predicate the engine uses to switch to the full
//! collection, so the full collection is never shown with page controls.

use serde::Serialize;

use crate::engine;
use crate::models::{FilterSelection, SearchQuery, PAGE_SIZE};

/// `ceil(count / PAGE_SIZE)`, never less than 1.
pub fn total_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// Whether page controls should be shown.
pub fn controls_visible(query: &SearchQuery, selection: &FilterSelection) -> bool {
    !engine::is_narrowed(query, selection)
}

/// Current page and total page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub current_page: u64,
    pub total_pages: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
        }
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the total from a freshly fetched page's count.
    pub fn set_count(&mut self, count: u64) {
        self.total_pages = total_pages(count);
    }

    /// Move to `page`, clamped into range. Returns `true` when the page
    /// changed and must be fetched.
    pub fn go_to(&mut self, page: u64) -> bool {
        let target = page.clamp(1, self.total_pages);
        if target == self.current_page {
            return false;
        }
        self.current_page = target;
        true
    }

    /// Back to page 1. Returns `true` when the page changed.
    pub fn reset(&mut self) -> bool {
        let changed = self.current_page != 1;
        self.current_page = 1;
        changed
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page-number strip centred on the current page.
    ///
    /// Shows at most `max_visible` consecutive numbers, plus the first and
    /// last page with ellipses when they fall outside the window.
    pub fn window(&self, max_visible: u64) -> Vec<PageMarker> {
        let max_visible = max_visible.max(1);
        let current = self.current_page.min(self.total_pages);
        let mut start = current.saturating_sub(max_visible / 2).max(1);
        let end = (start + max_visible - 1).min(self.total_pages);
        if end - start < max_visible - 1 {
            start = (end + 1).saturating_sub(max_visible).max(1);
        }

        let mut markers = Vec::new();
        if start > 1 {
            markers.push(PageMarker::Page(1));
            if start > 2 {
                markers.push(PageMarker::Ellipsis);
            }
        }
        markers.extend((start..=end).map(PageMarker::Page));
        if end < self.total_pages {
            if end + 1 < self.total_pages {
                markers.push(PageMarker::Ellipsis);
            }
            markers.push(PageMarker::Page(self.total_pages));
        }
        markers
    }
}

/// One entry of the page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMarker {
    Page(u64),
    Ellipsis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageMarker::{Ellipsis, Page};

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(82), 9);
        assert_eq!(total_pages(80), 8);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(0), 1);
    }

    #[test]
    fn test_go_to_clamps() {
        let mut p = PaginationState::new();
        p.set_count(82);
        assert!(p.go_to(4));
        assert!(!p.go_to(4));
        assert!(p.go_to(100));
        assert_eq!(p.current_page, 9);
        assert!(!p.has_next());
        assert!(p.go_to(0));
        assert_eq!(p.current_page, 1);
        assert!(!p.has_previous());
    }

    #[test]
    fn test_controls_hidden_when_narrowed() {
        let none = FilterSelection::default();
        assert!(controls_visible(&SearchQuery::new(" "), &none));
        assert!(!controls_visible(&SearchQuery::new("luke"), &none));
        let sel = FilterSelection::new(None, None, Some("f".into()));
        assert!(!controls_visible(&SearchQuery::default(), &sel));
    }

    #[test]
    fn test_window_middle() {
        let p = PaginationState {
            current_page: 5,
            total_pages: 9,
        };
        assert_eq!(
            p.window(5),
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(9)]
        );
    }

    #[test]
    fn test_window_edges() {
        let first = PaginationState {
            current_page: 1,
            total_pages: 9,
        };
        assert_eq!(
            first.window(3),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(9)]
        );

        let last = PaginationState {
            current_page: 9,
            total_pages: 9,
        };
        assert_eq!(
            last.window(3),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9)]
        );

        let small = PaginationState {
            current_page: 2,
            total_pages: 2,
        };
        assert_eq!(small.window(5), vec![Page(1), Page(2)]);
    }
}
