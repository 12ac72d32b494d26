//! Entity hydration core.
//!
//! Converts domain entities to plain associative data and back, and keeps
//! to-many associations in sync with incoming data by reconciling them in
//! place, by identity.

pub mod access;
pub mod collection;
pub mod config;
pub mod factory;
pub mod filter;
pub mod hydrator;
pub mod identity;
pub mod logging;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod registry;
pub mod strategy;

pub use access::{getter_name, setter_name, AccessError, FieldAccessor};
pub use collection::{Collection, EntityCollection};
pub use config::{ConfigLoadError, FilterConfig, HydratorConfig, HydratorsConfig};
pub use factory::{ConfigurationError, HydratorFactory};
pub use filter::{FieldListFilter, FilterComposite, FilterCondition, PropertyFilter};
pub use hydrator::{DelegatingHydrator, HydrateError, Hydrator, ObjectHydrator};
pub use identity::{
    EntityIdentity, IdentityComparator, IdentityToken, KeyFn, PrimaryKeyIdentity,
    ReferenceIdentity,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entity::{Entity, EntityAssociation, EntityId, EntityRef, FieldKind, FieldValue};
pub use model::store::{EntityResolver, EntityStore, StoreError};
pub use naming::{
    IdentityNamingStrategy, MapNamingStrategy, NamingStrategy, UnderscoreNamingStrategy,
};
pub use reconcile::{
    apply_delta, compute_delta, reconcile_collection, CollectionDelta, CollectionReconciler,
    DuplicatePolicy, ReconcileError, ReconcileOptions, Reconciled,
};
pub use registry::{RegistryError, Service, ServiceKind, ServiceRegistry};
pub use strategy::{CollectionStrategy, HydrationStrategy};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
