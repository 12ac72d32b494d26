//! Per-field hydration strategies.
//!
//! # Responsibility
//! - Convert one field between domain storage and plain data.
//! - Provide the four collection strategies: allow/disallow remove, each
//!   by value or by reference.
//!
//! # Invariants
//! - Incoming references are resolved before the collection is touched; a
//!   bad reference leaves the collection unchanged.
//! - Collections are mutated in place, never replaced.

use crate::access::FieldAccessor;
use crate::hydrator::{resolve_references, HydrateError};
use crate::identity::EntityIdentity;
use crate::model::entity::{Entity, EntityRef, FieldValue};
use crate::model::store::EntityResolver;
use crate::reconcile::{CollectionReconciler, DuplicatePolicy, ReconcileOptions};
use serde_json::Value;
use std::sync::Arc;

/// Strategy registry key: add and remove, via `get<Field>`.
pub const STRATEGY_ALLOW_REMOVE_BY_VALUE: &str = "allow_remove_by_value";
/// Strategy registry key: add and remove, via field storage.
pub const STRATEGY_ALLOW_REMOVE_BY_REFERENCE: &str = "allow_remove_by_reference";
/// Strategy registry key: add only, via `get<Field>`.
pub const STRATEGY_DISALLOW_REMOVE_BY_VALUE: &str = "disallow_remove_by_value";
/// Strategy registry key: add only, via field storage.
pub const STRATEGY_DISALLOW_REMOVE_BY_REFERENCE: &str = "disallow_remove_by_reference";

/// Converts one field between storage and plain data.
pub trait HydrationStrategy {
    /// Plain-data projection of a stored field.
    fn extract(&self, value: &FieldValue) -> Value;

    /// Writes incoming plain data into `object.<field>`.
    fn hydrate(
        &self,
        object: &mut Entity,
        field: &str,
        value: &Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError>;

    /// Copy of this strategy comparing collection members by `identity`.
    ///
    /// `None` for strategies that do not compare members.
    fn rebind_identity(&self, _identity: EntityIdentity) -> Option<Arc<dyn HydrationStrategy>> {
        None
    }
}

/// Collection strategy backed by `CollectionReconciler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStrategy {
    reconciler: CollectionReconciler,
}

impl CollectionStrategy {
    /// Adds missing and removes surplus members.
    pub fn allow_remove(accessor: FieldAccessor) -> Self {
        Self {
            reconciler: CollectionReconciler::new(accessor),
        }
    }

    /// Adds missing members and never removes.
    pub fn disallow_remove(accessor: FieldAccessor) -> Self {
        let reconciler = CollectionReconciler::new(accessor).with_options(ReconcileOptions {
            allow_remove: false,
            ..ReconcileOptions::default()
        });
        Self { reconciler }
    }

    pub fn with_identity(mut self, identity: EntityIdentity) -> Self {
        self.reconciler = self.reconciler.with_identity(identity);
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        let options = ReconcileOptions {
            duplicates,
            ..self.reconciler.options()
        };
        self.reconciler = self.reconciler.with_options(options);
        self
    }

    pub fn reconciler(&self) -> &CollectionReconciler {
        &self.reconciler
    }
}

impl HydrationStrategy for CollectionStrategy {
    fn extract(&self, value: &FieldValue) -> Value {
        extract_field_value(value)
    }

    fn hydrate(
        &self,
        object: &mut Entity,
        field: &str,
        value: &Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError> {
        let target_kind = self
            .reconciler
            .accessor()
            .collection(object, field)?
            .target_kind()
            .to_string();
        let desired = resolve_references(field, &target_kind, value, resolver)?;
        self.reconciler.reconcile(object, field, &desired)?;
        Ok(())
    }

    fn rebind_identity(&self, identity: EntityIdentity) -> Option<Arc<dyn HydrationStrategy>> {
        Some(Arc::new(self.with_identity(identity)))
    }
}

/// Default plain-data projection of a stored field.
///
/// Associations and collection members are projected to their primary key;
/// transient entities project to `null`.
///
/// A `null` collection item is not a reference, so hydrating extracted data
/// back fails with `InvalidReference` while a collection holds unsaved
/// members. Persist them (or drop them from the data) first.
pub fn extract_field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Scalar(value) => value.clone(),
        FieldValue::Association(association) => association
            .target()
            .map(entity_id_value)
            .unwrap_or(Value::Null),
        FieldValue::Collection(collection) => {
            Value::Array(collection.iter().map(entity_id_value).collect())
        }
    }
}

fn entity_id_value(entity: &EntityRef) -> Value {
    match entity.id() {
        Some(id) => Value::String(id.to_string()),
        None => Value::Null,
    }
}
