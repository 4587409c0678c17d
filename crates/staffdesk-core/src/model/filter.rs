// ── Filter state ──
//
// Named predicates edited by the presentation layer. Blank entries mean
// "no filter" and never reach the wire.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value of a single filter field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    /// Foreign-key selector (department id, position id, ...).
    Id(String),
    Number(i64),
    /// Inclusive date range; either bound may be open.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl FilterValue {
    /// `true` when this value filters nothing: blank text or id after
    /// trimming, or a range with neither bound.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) | Self::Id(s) => s.trim().is_empty(),
            Self::DateRange { from, to } => from.is_none() && to.is_none(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Serialize under `param`. Date ranges expand to `<param>From` and
    /// `<param>To`, each omitted when open.
    pub(crate) fn to_params(&self, param: &str) -> Vec<(String, String)> {
        match self {
            Self::Text(s) | Self::Id(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![(param.to_owned(), trimmed.to_owned())]
                }
            }
            Self::Bool(b) => vec![(param.to_owned(), b.to_string())],
            Self::Number(n) => vec![(param.to_owned(), n.to_string())],
            Self::DateRange { from, to } => {
                let mut out = Vec::with_capacity(2);
                if let Some(from) = from {
                    out.push((format!("{param}From"), from.format("%Y-%m-%d").to_string()));
                }
                if let Some(to) = to {
                    out.push((format!("{param}To"), to.format("%Y-%m-%d").to_string()));
                }
                out
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Ordered map of filter field name to value.
///
/// Backed by a `BTreeMap`, so insertion order never influences equality
/// or the query key built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    fields: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Set a field; `None` removes it.
    pub fn set(&mut self, field: impl Into<String>, value: Option<FilterValue>) {
        let field = field.into();
        match value {
            Some(value) => {
                self.fields.insert(field, value);
            }
            None => {
                self.fields.remove(&field);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy without blank entries. Two states that filter the same rows
    /// have equal normalized forms.
    pub fn normalized(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(_, v)| !v.is_blank())
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        }
    }

    /// `true` if no field would be sent to the server.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(FilterValue::is_blank)
    }
}

fn normalize_value(value: &FilterValue) -> FilterValue {
    match value {
        FilterValue::Text(s) => FilterValue::Text(s.trim().to_owned()),
        FilterValue::Id(s) => FilterValue::Id(s.trim().to_owned()),
        other => other.clone(),
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (k, v) in iter {
            state.set(k, Some(v.into()));
        }
        state
    }
}
