//! Offset-based pagination shared by the feed and comment threads.

use serde::Serialize;

/// A validated `(page, page_size)` pair. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Clamps client input: page to at least 1, size to `1..=max_size`.
    pub fn new(page: u32, page_size: u32, max_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Wraps one fetched page together with the unpaginated total.
    pub fn wrap<T>(&self, items: Vec<T>, total: u64) -> Page<T> {
        let size = u64::from(self.page_size);
        Page {
            items,
            current_page: self.page,
            total_pages: total.div_ceil(size),
            total,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total: self.total,
        }
    }
}
