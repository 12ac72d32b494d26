//! Builds configured hydrators from registry services.
//!
//! # Responsibility
//! - Turn one named `HydratorConfig` into a ready `DelegatingHydrator`.
//! - Resolve every service key once, failing with a `ConfigurationError`
//!   for missing or wrongly typed services.
//!
//! # Invariants
//! - A custom `hydrator` service is used as-is for both directions; field
//!   configuration only applies to the built-in object hydrator.
//! - Filters are applied first, then strategies, then the naming strategy.
//! - The hydrator's `identity` applies to every collection strategy it uses,
//!   configured or default.

use crate::access::FieldAccessor;
use crate::config::{HydratorConfig, HydratorsConfig};
use crate::hydrator::{DelegatingHydrator, ObjectHydrator};
use crate::registry::{Service, ServiceKind, ServiceRegistry};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Setup-time wiring failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No definition exists for the requested hydrator.
    MissingHydratorConfig(String),
    /// A referenced service key is not registered.
    ServiceNotFound {
        expected: ServiceKind,
        service: String,
        target: String,
    },
    /// A referenced service exists but provides another capability.
    WrongServiceKind {
        expected: ServiceKind,
        found: ServiceKind,
        service: String,
        target: String,
    },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHydratorConfig(name) => {
                write!(f, "could not retrieve config for `{name}` hydrator service")
            }
            Self::ServiceNotFound {
                expected,
                service,
                target,
            } => write!(
                f,
                "invalid {expected} `{service}` for {target}: service does not exist"
            ),
            Self::WrongServiceKind {
                expected,
                found,
                service,
                target,
            } => write!(
                f,
                "invalid {expected} `{service}` for {target}: service is a {found}"
            ),
        }
    }
}

impl Error for ConfigurationError {}

/// Hydrator factory over one configuration document and one registry.
#[derive(Debug, Clone, Copy)]
pub struct HydratorFactory<'a> {
    config: &'a HydratorsConfig,
    registry: &'a ServiceRegistry,
}

impl<'a> HydratorFactory<'a> {
    pub fn new(config: &'a HydratorsConfig, registry: &'a ServiceRegistry) -> Self {
        Self { config, registry }
    }

    /// Builds the hydrator configured under `name`.
    pub fn build(&self, name: &str) -> Result<DelegatingHydrator, ConfigurationError> {
        let config = self
            .config
            .get(name)
            .ok_or_else(|| ConfigurationError::MissingHydratorConfig(name.to_string()))?;

        if let Some(custom) = config.hydrator.as_deref() {
            let target = format!("hydrator `{name}`");
            let service = match self.resolve(ServiceKind::Hydrator, custom, &target)? {
                Service::Hydrator(hydrator) => hydrator.clone(),
                other => return Err(wrong_kind(ServiceKind::Hydrator, other, custom, &target)),
            };
            if has_field_configuration(config) {
                warn!(
                    "event=hydrator_build module=factory status=ok hydrator={} custom={} field_config=ignored",
                    name, custom
                );
            }
            info!(
                "event=hydrator_build module=factory status=ok hydrator={} custom={}",
                name, custom
            );
            return Ok(DelegatingHydrator::shared(service));
        }

        let mut hydrator = ObjectHydrator::new(FieldAccessor::from_by_value(config.by_value));
        hydrator.set_identity(config.identity);
        self.configure_hydrator(&mut hydrator, config)?;
        info!(
            "event=hydrator_build module=factory status=ok hydrator={} mode={} strategies={} filters={}",
            name,
            hydrator.accessor().as_str(),
            config.strategies.len(),
            config.filters.len()
        );
        Ok(DelegatingHydrator::shared(Arc::new(hydrator)))
    }

    /// Builds every configured hydrator, stopping at the first failure.
    pub fn build_all(&self) -> Result<BTreeMap<String, DelegatingHydrator>, ConfigurationError> {
        self.config
            .hydrator_names()
            .map(|name| -> Result<_, ConfigurationError> {
                Ok((name.to_string(), self.build(name)?))
            })
            .collect()
    }

    /// Applies filters, strategies and naming strategy from `config`.
    pub fn configure_hydrator(
        &self,
        hydrator: &mut ObjectHydrator,
        config: &HydratorConfig,
    ) -> Result<(), ConfigurationError> {
        self.configure_filters(hydrator, config)?;
        self.configure_strategies(hydrator, config)?;
        self.configure_naming_strategy(hydrator, config)
    }

    fn configure_filters(
        &self,
        hydrator: &mut ObjectHydrator,
        config: &HydratorConfig,
    ) -> Result<(), ConfigurationError> {
        for (name, filter_config) in &config.filters {
            let target = format!("filter `{name}`");
            let filter = match self.resolve(ServiceKind::Filter, &filter_config.filter, &target)? {
                Service::Filter(filter) => filter.clone(),
                other => {
                    return Err(wrong_kind(
                        ServiceKind::Filter,
                        other,
                        &filter_config.filter,
                        &target,
                    ))
                }
            };
            hydrator.add_filter(name.clone(), filter, filter_config.condition);
        }
        Ok(())
    }

    fn configure_strategies(
        &self,
        hydrator: &mut ObjectHydrator,
        config: &HydratorConfig,
    ) -> Result<(), ConfigurationError> {
        for (field, key) in &config.strategies {
            let target = format!("field `{field}`");
            let strategy = match self.resolve(ServiceKind::Strategy, key, &target)? {
                Service::Strategy(strategy) => strategy.clone(),
                other => return Err(wrong_kind(ServiceKind::Strategy, other, key, &target)),
            };
            let strategy = strategy
                .rebind_identity(config.identity)
                .unwrap_or(strategy);
            hydrator.add_strategy(field.clone(), strategy);
        }
        Ok(())
    }

    fn configure_naming_strategy(
        &self,
        hydrator: &mut ObjectHydrator,
        config: &HydratorConfig,
    ) -> Result<(), ConfigurationError> {
        let Some(key) = config.naming_strategy.as_deref() else {
            return Ok(());
        };
        let target = "naming".to_string();
        let naming = match self.resolve(ServiceKind::NamingStrategy, key, &target)? {
            Service::NamingStrategy(naming) => naming.clone(),
            other => return Err(wrong_kind(ServiceKind::NamingStrategy, other, key, &target)),
        };
        hydrator.set_naming_strategy(naming);
        Ok(())
    }

    fn resolve(
        &self,
        expected: ServiceKind,
        key: &str,
        target: &str,
    ) -> Result<&'a Service, ConfigurationError> {
        self.registry
            .get(key)
            .ok_or_else(|| ConfigurationError::ServiceNotFound {
                expected,
                service: key.to_string(),
                target: target.to_string(),
            })
    }
}

fn wrong_kind(
    expected: ServiceKind,
    found: &Service,
    key: &str,
    target: &str,
) -> ConfigurationError {
    ConfigurationError::WrongServiceKind {
        expected,
        found: found.kind(),
        service: key.to_string(),
        target: target.to_string(),
    }
}

fn has_field_configuration(config: &HydratorConfig) -> bool {
    !config.strategies.is_empty() || !config.filters.is_empty() || config.naming_strategy.is_some()
}

#[cfg(test)]
mod tests {
    use super::{ConfigurationError, HydratorFactory};
    use crate::config::HydratorsConfig;
    use crate::registry::{ServiceKind, ServiceRegistry};

    #[test]
    fn missing_definition_is_reported_by_name() {
        let config = HydratorsConfig::default();
        let registry = ServiceRegistry::with_builtins();
        let err = HydratorFactory::new(&config, &registry)
            .build("article")
            .err()
            .expect("missing definition must fail");
        assert_eq!(
            err,
            ConfigurationError::MissingHydratorConfig("article".to_string())
        );
    }

    #[test]
    fn wrong_service_kind_is_reported() {
        let config = HydratorsConfig::from_json_str(
            r#"{ "hydrators": { "article": { "strategies": { "tags": "underscore" } } } }"#,
        )
        .expect("config should parse");
        let registry = ServiceRegistry::with_builtins();
        let err = HydratorFactory::new(&config, &registry)
            .build("article")
            .err()
            .expect("naming service used as strategy must fail");
        assert_eq!(
            err,
            ConfigurationError::WrongServiceKind {
                expected: ServiceKind::Strategy,
                found: ServiceKind::NamingStrategy,
                service: "underscore".to_string(),
                target: "field `tags`".to_string(),
            }
        );
        assert!(err.to_string().contains("invalid strategy `underscore`"));
    }
}
