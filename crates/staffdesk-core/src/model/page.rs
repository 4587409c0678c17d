use serde::{Deserialize, Serialize};

/// One page of a collection, normalized from whatever shape the endpoint
/// returned. `total` is the server-side row count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> ListPage<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages needed to show `total` rows at `page_size` per page.
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(page_size))
    }

    /// A page ends an exhaustive walk when it is empty or shorter than
    /// the size that was requested.
    pub fn signals_completion(&self, requested: u32) -> bool {
        let requested = usize::try_from(requested).unwrap_or(usize::MAX);
        self.items.is_empty() || self.items.len() < requested
    }
}
