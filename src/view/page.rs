//! Page bookkeeping.

use std::ops::RangeInclusive;

use super::render::PageIndicator;

/// Entry count, page count and current page (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    entries_count: usize,
    page_count: usize,
    current_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            entries_count: 0,
            page_count: 1,
            current_page: 1,
        }
    }
}

/// `max(1, ceil(entries / per_page))`. A zero page size counts as one.
pub fn page_count_for(entries: usize, per_page: usize) -> usize {
    entries.div_ceil(per_page.max(1)).max(1)
}

impl PageState {
    pub fn entries_count(&self) -> usize {
        self.entries_count
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Take a fresh entry count and clamp the current page into range.
    pub fn recompute(&mut self, entries: usize, per_page: usize) {
        self.entries_count = entries;
        self.page_count = page_count_for(entries, per_page);
        if self.current_page > self.page_count {
            self.current_page = self.page_count;
        }
    }

    /// Switch page. Returns false, leaving the state untouched, unless the
    /// page differs from the current one and lies in `1..=page_count`.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page == self.current_page || page == 0 || page > self.page_count {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn prev_enabled(&self) -> bool {
        self.current_page > 1
    }

    pub fn next_enabled(&self) -> bool {
        self.current_page != self.page_count
    }

    /// Offset and limit of the current page.
    pub fn window(&self, per_page: usize) -> (usize, usize) {
        let per_page = per_page.max(1);
        (per_page * (self.current_page - 1), per_page)
    }

    /// Unpaginated indices covered by the current page.
    pub fn index_range(&self, per_page: usize) -> RangeInclusive<usize> {
        let (first, limit) = self.window(per_page);
        first..=first + limit - 1
    }

    /// Offset of the entry that moves onto this page when one of its entries
    /// is removed, i.e. the first entry of the next page before the removal.
    pub fn backfill_offset(&self, per_page: usize) -> usize {
        per_page.max(1) * self.current_page - 1
    }

    pub fn indicator(&self) -> PageIndicator {
        PageIndicator {
            current: self.current_page,
            count: self.page_count,
            prev_enabled: self.prev_enabled(),
            next_enabled: self.next_enabled(),
        }
    }
}
