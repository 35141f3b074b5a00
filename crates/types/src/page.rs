//! List-shaped payload convention shared by all collection scripts.

use serde::{Deserialize, Serialize};

/// Pagination metadata reported by list scripts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub returned: u64,
    pub has_more: bool,
}

/// A page of items plus its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> ListPage<T> {
    /// Empty page used as a non-failing fallback.
    pub fn empty(offset: u64, limit: u64) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination {
                total: 0,
                offset,
                limit,
                returned: 0,
                has_more: false,
            },
        }
    }

    /// Wrap a complete, unpaginated collection.
    pub fn from_items(items: Vec<T>) -> Self {
        let count = items.len() as u64;
        Self {
            items,
            pagination: Pagination {
                total: count,
                offset: 0,
                limit: count,
                returned: count,
                has_more: false,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self::empty(0, 0)
    }
}
