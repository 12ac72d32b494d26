//! Named service registry for hydrator wiring.
//!
//! Configuration refers to strategies, filters, naming strategies and
//! custom hydrators by string key. The registry maps those keys to typed
//! services so the factory can resolve them once at setup.

use crate::access::FieldAccessor;
use crate::filter::PropertyFilter;
use crate::hydrator::Hydrator;
use crate::naming::{IdentityNamingStrategy, NamingStrategy, UnderscoreNamingStrategy};
use crate::strategy::{
    CollectionStrategy, HydrationStrategy, STRATEGY_ALLOW_REMOVE_BY_REFERENCE,
    STRATEGY_ALLOW_REMOVE_BY_VALUE, STRATEGY_DISALLOW_REMOVE_BY_REFERENCE,
    STRATEGY_DISALLOW_REMOVE_BY_VALUE,
};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Naming registry key: field names used as-is.
pub const NAMING_IDENTITY: &str = "identity";
/// Naming registry key: camelCase fields, snake_case keys.
pub const NAMING_UNDERSCORE: &str = "underscore";

/// Capability a registered service provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceKind {
    Strategy,
    Filter,
    NamingStrategy,
    Hydrator,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::Filter => "filter",
            Self::NamingStrategy => "naming strategy",
            Self::Hydrator => "hydrator",
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered service.
#[derive(Clone)]
pub enum Service {
    Strategy(Arc<dyn HydrationStrategy>),
    Filter(Arc<dyn PropertyFilter>),
    NamingStrategy(Arc<dyn NamingStrategy>),
    Hydrator(Arc<dyn Hydrator>),
}

impl Service {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Strategy(_) => ServiceKind::Strategy,
            Self::Filter(_) => ServiceKind::Filter,
            Self::NamingStrategy(_) => ServiceKind::NamingStrategy,
            Self::Hydrator(_) => ServiceKind::Hydrator,
        }
    }
}

impl Debug for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Service({})", self.kind())
    }
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidServiceName(String),
    DuplicateService(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidServiceName(value) => write!(f, "service name is invalid: `{value}`"),
            Self::DuplicateService(value) => write!(f, "service already registered: `{value}`"),
        }
    }
}

impl Error for RegistryError {}

/// Name -> service map.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the four collection strategies and the
    /// `identity` / `underscore` naming strategies.
    pub fn with_builtins() -> Self {
        let builtins: [(&str, Service); 6] = [
            (
                STRATEGY_ALLOW_REMOVE_BY_VALUE,
                Service::Strategy(Arc::new(CollectionStrategy::allow_remove(
                    FieldAccessor::ByValue,
                ))),
            ),
            (
                STRATEGY_ALLOW_REMOVE_BY_REFERENCE,
                Service::Strategy(Arc::new(CollectionStrategy::allow_remove(
                    FieldAccessor::ByReference,
                ))),
            ),
            (
                STRATEGY_DISALLOW_REMOVE_BY_VALUE,
                Service::Strategy(Arc::new(CollectionStrategy::disallow_remove(
                    FieldAccessor::ByValue,
                ))),
            ),
            (
                STRATEGY_DISALLOW_REMOVE_BY_REFERENCE,
                Service::Strategy(Arc::new(CollectionStrategy::disallow_remove(
                    FieldAccessor::ByReference,
                ))),
            ),
            (
                NAMING_IDENTITY,
                Service::NamingStrategy(Arc::new(IdentityNamingStrategy)),
            ),
            (
                NAMING_UNDERSCORE,
                Service::NamingStrategy(Arc::new(UnderscoreNamingStrategy)),
            ),
        ];

        let mut registry = Self::new();
        for (name, service) in builtins {
            registry.services.insert(name.to_string(), service);
        }
        registry
    }

    /// Registers one service under a unique name.
    pub fn register(
        &mut self,
        name: &str,
        service: Service,
    ) -> Result<(), RegistryError> {
        let name = name.trim().to_string();
        if !is_valid_service_name(&name) {
            return Err(RegistryError::InvalidServiceName(name));
        }
        if self.services.contains_key(name.as_str()) {
            return Err(RegistryError::DuplicateService(name));
        }
        self.services.insert(name, service);
        Ok(())
    }

    pub fn register_strategy(
        &mut self,
        name: &str,
        strategy: impl HydrationStrategy + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Service::Strategy(Arc::new(strategy)))
    }

    pub fn register_filter(
        &mut self,
        name: &str,
        filter: impl PropertyFilter + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Service::Filter(Arc::new(filter)))
    }

    pub fn register_naming_strategy(
        &mut self,
        name: &str,
        naming: impl NamingStrategy + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Service::NamingStrategy(Arc::new(naming)))
    }

    pub fn register_hydrator(
        &mut self,
        name: &str,
        hydrator: impl Hydrator + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Service::Hydrator(Arc::new(hydrator)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name.trim())
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name.trim())
    }

    /// Returns sorted service names.
    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Debug for ServiceRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.services.iter()).finish()
    }
}

fn is_valid_service_name(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '.'
    })
}
