// ── List response shapes ──
//
// Collection endpoints answer either with an envelope carrying the total
// row count or with a bare JSON array.

use serde::{Deserialize, Serialize};

/// Raw body of a collection `GET`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawListResponse<T> {
    /// `{ "items": [...], "totalItems": n }`
    Paged {
        items: Vec<T>,
        #[serde(rename = "totalItems", default)]
        total_items: Option<u64>,
    },
    /// `[...]`
    Bare(Vec<T>),
}

impl<T> RawListResponse<T> {
    /// Split into `(items, total)`. A bare array, or an envelope without a
    /// total, reports its own length.
    pub fn into_parts(self) -> (Vec<T>, u64) {
        match self {
            Self::Paged { items, total_items } => {
                let total = total_items.unwrap_or_else(|| count(&items));
                (items, total)
            }
            Self::Bare(items) => {
                let total = count(&items);
                (items, total)
            }
        }
    }
}

fn count<T>(items: &[T]) -> u64 {
    u64::try_from(items.len()).unwrap_or(u64::MAX)
}
