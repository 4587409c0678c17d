use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// What every subscriber of one key observes.
///
/// `data` is the last successful payload and survives failed
/// revalidations; `error` is the last failure and is cleared by the
/// next success. All subscribers share the same `Arc`s after a settle.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<CoreError>>,
    /// A request for this key is in flight.
    pub is_validating: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    /// First load: nothing to show yet and a request is pending.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_validating
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_validating: false,
            last_updated: None,
        }
    }
}

// Manual impl: `T` itself never needs to be `Clone`.
impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_validating: self.is_validating,
            last_updated: self.last_updated,
        }
    }
}
