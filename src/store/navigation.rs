//! Page-boundary arithmetic
//!
//! Handles First/Previous/Next/Last transitions, resizing, and the clamping
//! that keeps every window inside `[0, total)`.

use super::page::PageRole;

/// The current page window over the logical record space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First logical index of the current page
    pub start: usize,
    /// Length of the current page; shorter than `user_page_size` only on the final page
    pub page_size: usize,
    /// Configured nominal page length
    pub user_page_size: usize,
    /// One past the last index of the logical record space
    pub total: usize,
    /// Index `First` returns to; the base of the selected section
    pub default_start: usize,
}

impl PageWindow {
    pub fn new(total: usize, user_page_size: usize) -> Self {
        Self::section(0, total, user_page_size)
    }

    /// Window over `[default_start, total)`, positioned on its first page
    pub fn section(default_start: usize, total: usize, user_page_size: usize) -> Self {
        let user_page_size = user_page_size.max(1);
        let mut window = Self {
            start: default_start,
            page_size: user_page_size,
            user_page_size,
            total: total.max(default_start),
            default_start,
        };
        window.clamp();
        window
    }

    /// Records between `default_start` and `total`
    pub fn len(&self) -> usize {
        self.total - self.default_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the last index of the current page
    pub fn end(&self) -> usize {
        self.start + self.page_size
    }

    /// Whether `role` leads somewhere other than the current page
    pub fn has_page(&self, role: PageRole) -> bool {
        match role {
            PageRole::First | PageRole::Previous => self.start > self.default_start,
            PageRole::Next | PageRole::Last => self.total > self.end(),
        }
    }

    /// Recompute the window for `role`, then clamp it
    pub fn navigate(&mut self, role: PageRole) {
        match role {
            PageRole::First => {
                self.page_size = self.user_page_size;
                self.start = self.default_start;
            }
            PageRole::Previous => {
                self.page_size = self.user_page_size;
                // Going below the section resets to its top in clamp()
                self.start = self.start.saturating_sub(self.page_size);
            }
            PageRole::Next => {
                self.start += self.page_size;
                if self.start + self.page_size > self.total {
                    self.page_size = self.total.saturating_sub(self.start);
                } else {
                    self.page_size = self.user_page_size;
                }
            }
            PageRole::Last => {
                self.start = self.last_page_start();
                self.page_size = self.total - self.start;
            }
        }
        self.clamp();
    }

    /// Start of the final page when pages are aligned to `user_page_size`
    pub fn last_page_start(&self) -> usize {
        let len = self.len();
        if len == 0 {
            return self.default_start;
        }
        let remainder = len % self.user_page_size;
        let tail = if remainder == 0 {
            self.user_page_size
        } else {
            remainder
        };
        self.total - tail
    }

    /// Restore the configured page size at the current start.
    ///
    /// Returns `false` when the resized window would run past the end; the
    /// caller should go to the last page instead.
    pub fn resize(&mut self, user_page_size: usize) -> bool {
        self.user_page_size = user_page_size.max(1);
        self.page_size = self.user_page_size;
        if self.start + self.page_size >= self.total {
            return false;
        }
        self.clamp();
        true
    }

    /// Replace the logical record count and return to the first page
    pub fn reset_total(&mut self, total: usize) {
        self.total = total;
        self.navigate(PageRole::First);
    }

    fn clamp(&mut self) {
        if self.start < self.default_start {
            self.start = self.default_start;
        }
        if self.start > self.total {
            self.start = self.total;
        }
        if self.start + self.page_size > self.total {
            self.page_size = self.total - self.start;
        }
    }

    /// `"{start+1} to {end} of {total}"`, or `"No records"`
    pub fn navigation_string(&self) -> String {
        if self.is_empty() {
            return "No records".to_string();
        }
        format!("{} to {} of {}", self.start + 1, self.end(), self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_bounds(w: &PageWindow) {
        assert!(
            w.start + w.page_size <= w.total,
            "window {}..{} past total {}",
            w.start,
            w.end(),
            w.total
        );
        assert!(w.page_size <= w.user_page_size);
    }

    #[test]
    fn test_initial_window() {
        let w = PageWindow::new(250, 100);
        assert_eq!((w.start, w.page_size), (0, 100));
        assert_eq!(w.navigation_string(), "1 to 100 of 250");
    }

    #[test]
    fn test_initial_window_small_file() {
        let w = PageWindow::new(30, 100);
        assert_eq!((w.start, w.page_size), (0, 30));
        assert!(!w.has_page(PageRole::Next));
    }

    #[test]
    fn test_next_clamps_final_page() {
        let mut w = PageWindow::new(250, 100);
        w.navigate(PageRole::Next);
        assert_eq!((w.start, w.page_size), (100, 100));
        assert_eq!(w.navigation_string(), "101 to 200 of 250");

        w.navigate(PageRole::Next);
        assert_eq!((w.start, w.page_size), (200, 50));
        assert_eq!(w.navigation_string(), "201 to 250 of 250");
        assert!(!w.has_page(PageRole::Next));
        assert!(!w.has_page(PageRole::Last));
    }

    #[test]
    fn test_last_from_first() {
        let mut w = PageWindow::new(250, 100);
        w.navigate(PageRole::Last);
        assert_eq!((w.start, w.page_size), (200, 50));
    }

    #[test]
    fn test_last_exact_multiple() {
        let mut w = PageWindow::new(300, 100);
        w.navigate(PageRole::Last);
        assert_eq!((w.start, w.page_size), (200, 100));
    }

    #[test]
    fn test_last_from_last_is_stable() {
        let mut w = PageWindow::new(230, 100);
        w.navigate(PageRole::Last);
        assert_eq!((w.start, w.page_size), (200, 30));
        w.navigate(PageRole::Last);
        assert_eq!((w.start, w.page_size), (200, 30));
    }

    #[test]
    fn test_previous_from_last_short_page() {
        let mut w = PageWindow::new(250, 100);
        w.navigate(PageRole::Last);
        w.navigate(PageRole::Previous);
        assert_eq!((w.start, w.page_size), (100, 100));
    }

    #[test]
    fn test_previous_clamps_to_zero() {
        let mut w = PageWindow::new(250, 100);
        w.start = 30;
        w.navigate(PageRole::Previous);
        assert_eq!((w.start, w.page_size), (0, 100));
        assert!(!w.has_page(PageRole::Previous));
        assert!(!w.has_page(PageRole::First));
    }

    #[test]
    fn test_next_then_previous_round_trip() {
        let mut w = PageWindow::new(1000, 100);
        w.navigate(PageRole::Next);
        w.navigate(PageRole::Next);
        let before = w;
        w.navigate(PageRole::Next);
        w.navigate(PageRole::Previous);
        assert_eq!(w, before);
    }

    #[test]
    fn test_first_is_idempotent() {
        let mut w = PageWindow::new(250, 100);
        w.navigate(PageRole::Next);
        w.navigate(PageRole::First);
        let once = w;
        w.navigate(PageRole::First);
        assert_eq!(w, once);
    }

    #[test]
    fn test_empty_total() {
        let mut w = PageWindow::new(0, 50);
        assert_eq!(w.navigation_string(), "No records");
        for role in PageRole::ALL {
            w.navigate(role);
            assert_eq!((w.start, w.page_size), (0, 0));
            assert!(!w.has_page(role));
        }
    }

    #[test]
    fn test_all_roles_stay_in_bounds() {
        for total in [0, 1, 7, 49, 50, 51, 99, 100, 101, 250, 1000] {
            for size in [1, 3, 10, 50, 100, 500] {
                let mut w = PageWindow::new(total, size);
                assert_in_bounds(&w);
                let script = [
                    PageRole::Next,
                    PageRole::Next,
                    PageRole::Last,
                    PageRole::Previous,
                    PageRole::Next,
                    PageRole::Next,
                    PageRole::First,
                    PageRole::Previous,
                    PageRole::Last,
                    PageRole::Last,
                ];
                for role in script {
                    if matches!(role, PageRole::Next | PageRole::Previous) && !w.has_page(role) {
                        continue;
                    }
                    w.navigate(role);
                    assert_in_bounds(&w);
                }
            }
        }
    }

    #[test]
    fn test_resize_in_middle() {
        let mut w = PageWindow::new(1000, 100);
        w.navigate(PageRole::Next);
        assert!(w.resize(50));
        assert_eq!((w.start, w.page_size), (100, 50));
    }

    #[test]
    fn test_resize_past_end_requests_last() {
        let mut w = PageWindow::new(250, 50);
        w.navigate(PageRole::Last);
        assert_eq!(w.start, 200);
        assert!(!w.resize(100));
        w.navigate(PageRole::Last);
        assert_eq!((w.start, w.page_size), (200, 50));
    }

    #[test]
    fn test_reset_total_returns_to_first() {
        let mut w = PageWindow::new(250, 100);
        w.navigate(PageRole::Last);
        w.reset_total(12);
        assert_eq!((w.start, w.page_size, w.total), (0, 12, 12));
        assert_eq!(w.navigation_string(), "1 to 12 of 12");
    }

    #[test]
    fn test_section_window_stays_inside_section() {
        let mut w = PageWindow::section(200, 400, 30);
        assert_eq!((w.start, w.page_size), (200, 30));
        assert_eq!(w.len(), 200);
        assert!(!w.has_page(PageRole::First));
        assert!(!w.has_page(PageRole::Previous));
        assert_eq!(w.navigation_string(), "201 to 230 of 400");

        w.navigate(PageRole::Last);
        // 200 records in pages of 30 leave 20 on the last page
        assert_eq!((w.start, w.page_size), (380, 20));

        w.navigate(PageRole::Previous);
        assert_eq!((w.start, w.page_size), (350, 30));

        w.start = 210;
        w.navigate(PageRole::Previous);
        assert_eq!((w.start, w.page_size), (200, 30));

        w.navigate(PageRole::Next);
        w.navigate(PageRole::First);
        assert_eq!(w.start, 200);
    }

    #[test]
    fn test_empty_section() {
        let w = PageWindow::section(50, 50, 10);
        assert_eq!((w.start, w.page_size), (50, 0));
        assert_eq!(w.navigation_string(), "No records");
    }
}
