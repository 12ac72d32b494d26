//! Hydrator configuration documents.
//!
//! # Responsibility
//! - Deserialize named hydrator definitions from JSON.
//! - Keep configuration as plain values; service keys are resolved later by
//!   `HydratorFactory`.
//!
//! # Invariants
//! - `by_value` defaults to `true`, `identity` to `reference`, filter
//!   `condition` to `or`.
//! - Unknown keys in a hydrator definition are rejected.

use crate::filter::FilterCondition;
use crate::identity::EntityIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratorsConfig {
    #[serde(default)]
    pub hydrators: BTreeMap<String, HydratorConfig>,
}

impl HydratorsConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigLoadError> {
        serde_json::from_str(source).map_err(ConfigLoadError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&source)
    }

    pub fn get(&self, name: &str) -> Option<&HydratorConfig> {
        self.hydrators.get(name)
    }

    /// Configured hydrator names in sorted order.
    pub fn hydrator_names(&self) -> impl Iterator<Item = &str> {
        self.hydrators.keys().map(String::as_str)
    }
}

/// One named hydrator definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HydratorConfig {
    /// Access fields through declared accessors instead of storage.
    #[serde(default = "default_by_value")]
    pub by_value: bool,
    /// Registry key of a custom hydrator replacing the object hydrator.
    #[serde(default)]
    pub hydrator: Option<String>,
    /// Identity used by the default collection strategy.
    #[serde(default)]
    pub identity: EntityIdentity,
    /// Field name -> strategy registry key.
    #[serde(default)]
    pub strategies: BTreeMap<String, String>,
    /// Filter name -> filter definition.
    #[serde(default)]
    pub filters: BTreeMap<String, FilterConfig>,
    /// Registry key of the naming strategy.
    #[serde(default)]
    pub naming_strategy: Option<String>,
}

impl Default for HydratorConfig {
    fn default() -> Self {
        Self {
            by_value: default_by_value(),
            hydrator: None,
            identity: EntityIdentity::default(),
            strategies: BTreeMap::new(),
            filters: BTreeMap::new(),
            naming_strategy: None,
        }
    }
}

/// One filter entry of a hydrator definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub condition: FilterCondition,
    /// Registry key of the filter service.
    pub filter: String,
}

fn default_by_value() -> bool {
    true
}

/// Failure reading or parsing a configuration document.
#[derive(Debug)]
pub enum ConfigLoadError {
    Io { path: PathBuf, message: String },
    Parse(serde_json::Error),
}

impl Display for ConfigLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid hydrator config: {err}"),
        }
    }
}

impl Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { .. } => None,
            Self::Parse(err) => Some(err),
        }
    }
}
