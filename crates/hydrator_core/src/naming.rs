//! Naming strategies between field names and plain-data keys.
//!
//! # Invariants
//! - `hydrate(extract(name)) == name` for names the strategy produced.
//! - Unknown names pass through unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

static ACRONYM_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym boundary regex"));
static CAMEL_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel boundary regex"));
static UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([a-z0-9])").expect("valid underscore regex"));

/// Maps field names to data keys (`extract`) and back (`hydrate`).
pub trait NamingStrategy {
    /// Data key -> field name.
    fn hydrate(&self, name: &str) -> String;
    /// Field name -> data key.
    fn extract(&self, name: &str) -> String;
}

/// Keys equal field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityNamingStrategy;

impl NamingStrategy for IdentityNamingStrategy {
    fn hydrate(&self, name: &str) -> String {
        name.to_string()
    }

    fn extract(&self, name: &str) -> String {
        name.to_string()
    }
}

/// camelCase field names, snake_case data keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnderscoreNamingStrategy;

impl NamingStrategy for UnderscoreNamingStrategy {
    fn hydrate(&self, name: &str) -> String {
        UNDERSCORE_RE
            .replace_all(name, |caps: &Captures| caps[1].to_uppercase())
            .into_owned()
    }

    fn extract(&self, name: &str) -> String {
        let split_acronyms = ACRONYM_BOUNDARY_RE.replace_all(name, "${1}_${2}");
        CAMEL_BOUNDARY_RE
            .replace_all(&split_acronyms, "${1}_${2}")
            .to_lowercase()
    }
}

/// Explicit field-name -> data-key mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapNamingStrategy {
    extraction: BTreeMap<String, String>,
    hydration: BTreeMap<String, String>,
}

impl MapNamingStrategy {
    /// Builds the strategy from `field -> key` pairs; the reverse map is
    /// derived.
    pub fn new<I, F, K>(extraction: I) -> Self
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<String>,
    {
        let extraction: BTreeMap<String, String> = extraction
            .into_iter()
            .map(|(field, key)| (field.into(), key.into()))
            .collect();
        let hydration = extraction
            .iter()
            .map(|(field, key)| (key.clone(), field.clone()))
            .collect();
        Self {
            extraction,
            hydration,
        }
    }
}

impl NamingStrategy for MapNamingStrategy {
    fn hydrate(&self, name: &str) -> String {
        self.hydration
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn extract(&self, name: &str) -> String {
        self.extraction
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        IdentityNamingStrategy, MapNamingStrategy, NamingStrategy, UnderscoreNamingStrategy,
    };

    #[test]
    fn underscore_extract_splits_camel_case() {
        let naming = UnderscoreNamingStrategy;
        assert_eq!(naming.extract("createdAt"), "created_at");
        assert_eq!(naming.extract("relatedTagIds"), "related_tag_ids");
        assert_eq!(naming.extract("HTTPServer"), "http_server");
        assert_eq!(naming.extract("title"), "title");
    }

    #[test]
    fn underscore_hydrate_joins_snake_case() {
        let naming = UnderscoreNamingStrategy;
        assert_eq!(naming.hydrate("created_at"), "createdAt");
        assert_eq!(naming.hydrate("related_tag_ids"), "relatedTagIds");
        assert_eq!(naming.hydrate("title"), "title");
    }

    #[test]
    fn map_strategy_falls_back_to_name() {
        let naming = MapNamingStrategy::new([("tags", "labels")]);
        assert_eq!(naming.extract("tags"), "labels");
        assert_eq!(naming.hydrate("labels"), "tags");
        assert_eq!(naming.extract("title"), "title");
        assert_eq!(naming.hydrate("title"), "title");
    }

    #[test]
    fn identity_strategy_is_passthrough() {
        assert_eq!(IdentityNamingStrategy.extract("createdAt"), "createdAt");
        assert_eq!(IdentityNamingStrategy.hydrate("created_at"), "created_at");
    }
}
