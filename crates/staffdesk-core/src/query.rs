// ── Query key builder ──
//
// Pure translation of (pagination, filter) into the canonical parameter
// set that identifies one request. The cache uses the result as its
// lookup key, so logically equal inputs must produce identical keys.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{FilterState, ListState};

pub const PAGE_NUMBER_PARAM: &str = "PageNumber";
pub const PAGE_SIZE_PARAM: &str = "PageSize";
pub const SORT_PARAM: &str = "Sort";

/// Canonical identity of one request: endpoint plus non-empty parameters
/// in fixed (lexicographic) order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Build a key from raw pairs. Values that are empty after trimming
    /// are dropped; later duplicates of a name win.
    pub fn new<K, V>(endpoint: impl Into<String>, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, String)| !v.trim().is_empty())
            .collect();
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parameters as owned pairs for `reqwest::RequestBuilder::query`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// `endpoint?A=1&B=2`, unescaped. For logs and diagnostics only.
impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)?;
        let mut sep = '?';
        for (k, v) in &self.params {
            write!(f, "{sep}{k}={v}")?;
            sep = '&';
        }
        Ok(())
    }
}

/// Per-resource key builder: the endpoint plus a field → parameter alias
/// table. Fields without an alias are sent under their own name.
///
/// Every builder starts with the console-wide alias `Search` → `SearchTerm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    endpoint: String,
    aliases: BTreeMap<String, String>,
}

impl KeyBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("Search".to_owned(), "SearchTerm".to_owned());
        Self {
            endpoint: endpoint.into(),
            aliases,
        }
    }

    /// Send filter `field` under parameter name `param`.
    pub fn alias(mut self, field: impl Into<String>, param: impl Into<String>) -> Self {
        self.aliases.insert(field.into(), param.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn param_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.aliases.get(field).map_or(field, String::as_str)
    }

    pub fn build(&self, list: &ListState, filter: &FilterState) -> QueryKey {
        let mut params: Vec<(String, String)> = vec![
            (PAGE_NUMBER_PARAM.to_owned(), list.page_number().to_string()),
            (PAGE_SIZE_PARAM.to_owned(), list.page_size().to_string()),
        ];
        if let Some(sort) = list.sort() {
            params.push((SORT_PARAM.to_owned(), sort.to_string()));
        }
        for (field, value) in filter.iter() {
            params.extend(value.to_params(self.param_name(field)));
        }
        QueryKey::new(self.endpoint.clone(), params)
    }
}

/// One-shot form of [`KeyBuilder::build`] with the default alias table.
pub fn build_key(list: &ListState, filter: &FilterState, endpoint: &str) -> QueryKey {
    KeyBuilder::new(endpoint).build(list, filter)
}
