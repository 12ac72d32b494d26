//! Property filters applied during extraction.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Decides whether a property is exposed in extracted data.
pub trait PropertyFilter {
    /// Returns `true` to keep `property`.
    fn filter(&self, property: &str) -> bool;
}

/// How a filter joins the composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    #[default]
    Or,
    And,
}

/// Allow-list or deny-list of field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldListFilter {
    fields: BTreeSet<String>,
    exclude: bool,
}

impl FieldListFilter {
    /// Keeps every property except `fields`.
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            exclude: true,
        }
    }

    /// Keeps only `fields`.
    pub fn allow_only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            exclude: false,
        }
    }
}

impl PropertyFilter for FieldListFilter {
    fn filter(&self, property: &str) -> bool {
        self.fields.contains(property) != self.exclude
    }
}

/// Named filters combined by condition.
///
/// A property passes when at least one `or` filter keeps it (or there are
/// none) and every `and` filter keeps it.
#[derive(Clone, Default)]
pub struct FilterComposite {
    or_filters: BTreeMap<String, Arc<dyn PropertyFilter>>,
    and_filters: BTreeMap<String, Arc<dyn PropertyFilter>>,
}

impl FilterComposite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the filter registered under `name`.
    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        filter: Arc<dyn PropertyFilter>,
        condition: FilterCondition,
    ) {
        let name = name.into();
        self.remove_filter(&name);
        match condition {
            FilterCondition::Or => self.or_filters.insert(name, filter),
            FilterCondition::And => self.and_filters.insert(name, filter),
        };
    }

    pub fn remove_filter(&mut self, name: &str) -> bool {
        let removed_or = self.or_filters.remove(name).is_some();
        let removed_and = self.and_filters.remove(name).is_some();
        removed_or || removed_and
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.or_filters.contains_key(name) || self.and_filters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.or_filters.len() + self.and_filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PropertyFilter for FilterComposite {
    fn filter(&self, property: &str) -> bool {
        let or_passes = self.or_filters.is_empty()
            || self
                .or_filters
                .values()
                .any(|filter| filter.filter(property));
        or_passes
            && self
                .and_filters
                .values()
                .all(|filter| filter.filter(property))
    }
}

impl Debug for FilterComposite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterComposite")
            .field("or", &self.or_filters.keys().collect::<Vec<_>>())
            .field("and", &self.and_filters.keys().collect::<Vec<_>>())
            .finish()
    }
}
