//! Field-by-field entity hydrator.
//!
//! # Responsibility
//! - Extract entity fields into plain data through filters, per-field
//!   strategies and the naming strategy.
//! - Hydrate plain data back into entity fields, reconciling collections in
//!   place.
//!
//! # Invariants
//! - By-value mode only reads fields with a declared getter and only writes
//!   scalars/associations with a declared setter.
//! - Collections without an explicit strategy use allow-remove in the
//!   hydrator's own access mode.
//! - Unknown data keys are ignored.

use crate::access::FieldAccessor;
use crate::filter::{FilterComposite, FilterCondition, PropertyFilter};
use crate::hydrator::{resolve_reference, HydrateError, Hydrator};
use crate::identity::EntityIdentity;
use crate::model::entity::{Entity, FieldKind, FieldValue};
use crate::model::store::EntityResolver;
use crate::naming::{IdentityNamingStrategy, NamingStrategy};
use crate::strategy::{extract_field_value, CollectionStrategy, HydrationStrategy};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Configurable hydrator over `Entity` fields.
#[derive(Clone)]
pub struct ObjectHydrator {
    accessor: FieldAccessor,
    identity: EntityIdentity,
    strategies: BTreeMap<String, Arc<dyn HydrationStrategy>>,
    filters: FilterComposite,
    naming: Arc<dyn NamingStrategy>,
}

impl ObjectHydrator {
    pub fn new(accessor: FieldAccessor) -> Self {
        Self {
            accessor,
            identity: EntityIdentity::default(),
            strategies: BTreeMap::new(),
            filters: FilterComposite::new(),
            naming: Arc::new(IdentityNamingStrategy),
        }
    }

    pub fn by_value() -> Self {
        Self::new(FieldAccessor::ByValue)
    }

    pub fn by_reference() -> Self {
        Self::new(FieldAccessor::ByReference)
    }

    pub fn accessor(&self) -> FieldAccessor {
        self.accessor
    }

    /// Identity used by the default collection strategy.
    pub fn set_identity(&mut self, identity: EntityIdentity) {
        self.identity = identity;
    }

    /// Sets the strategy for one field, replacing any previous one.
    pub fn add_strategy(&mut self, field: impl Into<String>, strategy: Arc<dyn HydrationStrategy>) {
        self.strategies.insert(field.into(), strategy);
    }

    pub fn has_strategy(&self, field: &str) -> bool {
        self.strategies.contains_key(field)
    }

    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        filter: Arc<dyn PropertyFilter>,
        condition: FilterCondition,
    ) {
        self.filters.add_filter(name, filter, condition);
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.has_filter(name)
    }

    pub fn set_naming_strategy(&mut self, naming: Arc<dyn NamingStrategy>) {
        self.naming = naming;
    }

    fn default_collection_strategy(&self) -> CollectionStrategy {
        CollectionStrategy::allow_remove(self.accessor).with_identity(self.identity)
    }

    fn hydrate_scalar(&self, object: &mut Entity, field: &str, value: &Value) {
        if !self.accessor.is_writable(object, field) {
            debug!(
                "event=hydrate_skip module=hydrator status=ok field={} reason=not_writable",
                field
            );
            return;
        }
        object.set_field(field, FieldValue::Scalar(value.clone()));
    }

    fn hydrate_association(
        &self,
        object: &mut Entity,
        field: &str,
        value: &Value,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError> {
        if !self.accessor.is_writable(object, field) {
            debug!(
                "event=hydrate_skip module=hydrator status=ok field={} reason=not_writable",
                field
            );
            return Ok(());
        }
        let target = match value {
            Value::Null => None,
            reference => {
                let kind = match object.field(field) {
                    Some(FieldValue::Association(association)) => {
                        association.target_kind().to_string()
                    }
                    _ => return Ok(()),
                };
                Some(resolve_reference(field, None, &kind, reference, resolver)?)
            }
        };
        if let Some(FieldValue::Association(association)) = object.field_mut(field) {
            association.set_target(target);
        }
        Ok(())
    }
}

impl Hydrator for ObjectHydrator {
    fn extract(&self, object: &Entity) -> Result<Map<String, Value>, HydrateError> {
        let mut data = Map::new();
        for (field, value) in object.fields() {
            if !self.accessor.is_readable(object, field) || !self.filters.filter(field) {
                continue;
            }
            let extracted = match self.strategies.get(field) {
                Some(strategy) => strategy.extract(value),
                None => extract_field_value(value),
            };
            data.insert(self.naming.extract(field), extracted);
        }
        debug!(
            "event=extract module=hydrator status=ok kind={} mode={} keys={}",
            object.kind(),
            self.accessor.as_str(),
            data.len()
        );
        Ok(data)
    }

    fn hydrate(
        &self,
        data: &Map<String, Value>,
        object: &mut Entity,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError> {
        for (key, value) in data {
            let field = self.naming.hydrate(key);
            if let Some(strategy) = self.strategies.get(&field) {
                strategy.hydrate(object, &field, value, resolver)?;
                continue;
            }
            match object.field(&field).map(FieldValue::kind) {
                Some(FieldKind::Collection) => {
                    self.default_collection_strategy()
                        .hydrate(object, &field, value, resolver)?;
                }
                Some(FieldKind::Association) => {
                    self.hydrate_association(object, &field, value, resolver)?;
                }
                Some(FieldKind::Scalar) => self.hydrate_scalar(object, &field, value),
                None => {
                    debug!(
                        "event=hydrate_skip module=hydrator status=ok key={} reason=unknown_field",
                        key
                    );
                }
            }
        }
        debug!(
            "event=hydrate module=hydrator status=ok kind={} mode={} keys={}",
            object.kind(),
            self.accessor.as_str(),
            data.len()
        );
        Ok(())
    }
}

impl Debug for ObjectHydrator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHydrator")
            .field("accessor", &self.accessor)
            .field("identity", &self.identity)
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("filters", &self.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectHydrator;
    use crate::collection::EntityCollection;
    use crate::hydrator::Hydrator;
    use crate::model::entity::{Entity, FieldValue};
    use crate::model::store::EntityStore;
    use serde_json::json;

    #[test]
    fn by_value_extract_only_exposes_fields_with_getters() {
        let article = Entity::new("article")
            .with_field("title", json!("hello"))
            .with_field("secret", json!("hidden"))
            .with_accessor("getTitle");

        let data = ObjectHydrator::by_value()
            .extract(&article)
            .expect("extract should succeed");
        assert_eq!(data.get("title"), Some(&json!("hello")));
        assert!(!data.contains_key("secret"));
    }

    #[test]
    fn by_value_hydrate_skips_scalars_without_setter() {
        let mut article = Entity::new("article")
            .with_field("title", json!("old"))
            .with_field("slug", json!("old-slug"))
            .with_accessor("setTitle");
        let data = json!({ "title": "new", "slug": "new-slug", "unknown": 1 });

        ObjectHydrator::by_value()
            .hydrate(
                data.as_object().expect("object literal"),
                &mut article,
                &EntityStore::new(),
            )
            .expect("hydrate should succeed");
        assert_eq!(article.field("title"), Some(&FieldValue::Scalar(json!("new"))));
        assert_eq!(
            article.field("slug"),
            Some(&FieldValue::Scalar(json!("old-slug")))
        );
        assert!(article.field("unknown").is_none());
    }

    #[test]
    fn null_collection_clears_members_by_reference() {
        let tag = Entity::new("tag").into_ref();
        let mut article = Entity::new("article")
            .with_field("tags", EntityCollection::with_items("tag", vec![tag]));
        let data = json!({ "tags": null });

        ObjectHydrator::by_reference()
            .hydrate(
                data.as_object().expect("object literal"),
                &mut article,
                &EntityStore::new(),
            )
            .expect("hydrate should succeed");
        match article.field("tags") {
            Some(FieldValue::Collection(collection)) => assert!(collection.is_empty()),
            other => panic!("tags should stay a collection, got {other:?}"),
        }
    }
}
