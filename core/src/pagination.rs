//! Offset pagination shared by list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number, starting at 1
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl Page {
    /// Build a page, clamping out-of-range values.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }

    /// Rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }

    /// Apply the page to an in-memory list.
    #[must_use]
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        items.iter().skip(offset).take(limit).cloned().collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total matching items
    pub total: u64,
    /// Page number
    pub page: u32,
    /// Page size
    pub page_size: u32,
}

impl<T> Paginated<T> {
    /// Wrap `items` for `page`.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        }
    }

    /// Convert the items, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_size() {
        let page = Page::new(Some(0), Some(1_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(Page::default().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn offset_and_slice() {
        let page = Page::new(Some(3), Some(2));
        assert_eq!(page.offset(), 4);
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(page.slice(&items), vec![4, 5]);
        assert!(Page::new(Some(9), Some(2)).slice(&items).is_empty());
    }
}
