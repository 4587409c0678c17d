// ── Pagination state ──

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single sort column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `"name,asc"` / `"name,desc"`; a bare key sorts ascending.
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, direction) = match raw.split_once(',') {
            Some((key, dir)) => {
                let direction = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return None,
                };
                (key.trim(), direction)
            }
            None => (raw.trim(), SortDirection::Asc),
        };
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_owned(),
            direction,
        })
    }
}

/// Wire form: `"<key>,<asc|desc>"`.
impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.key, self.direction.as_str())
    }
}

/// Pagination state of one list view. `page_index` is 0-based.
///
/// A page size of zero is treated as one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListState {
    page_index: u32,
    page_size: u32,
    sort: Option<SortSpec>,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sort: None,
        }
    }

    pub fn with_page(mut self, page_index: u32) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    /// 1-based page number as the server expects it.
    pub fn page_number(&self) -> u32 {
        self.page_index.saturating_add(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub(crate) fn set_page_index(&mut self, page_index: u32) {
        self.page_index = page_index;
    }

    pub(crate) fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    pub(crate) fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(ListState::new(0).page_size(), 1);
    }

    #[test]
    fn page_number_is_one_based() {
        let state = ListState::new(25).with_page(3);
        assert_eq!(state.page_index(), 3);
        assert_eq!(state.page_number(), 4);
    }

    #[test]
    fn sort_parse_and_display() {
        let sort = SortSpec::parse("hiredAt, DESC").expect("valid sort");
        assert_eq!(sort, SortSpec::desc("hiredAt"));
        assert_eq!(sort.to_string(), "hiredAt,desc");
        assert_eq!(SortSpec::parse("name"), Some(SortSpec::asc("name")));
        assert_eq!(SortSpec::parse("name,sideways"), None);
        assert_eq!(SortSpec::parse(" ,asc"), None);
    }
}
