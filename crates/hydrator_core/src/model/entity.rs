//! Entity domain model.
//!
//! # Responsibility
//! - Define the canonical domain object: kind, primary key, named fields.
//! - Declare which conventional accessors (`getTags`, `setTitle`) an object
//!   exposes, standing in for methods on a class.
//! - Provide `EntityRef`, the shared handle stored in associations.
//!
//! # Invariants
//! - `kind` and `id` are fixed for the entity lifetime.
//! - Field storage is keyed by field name; accessor declarations are
//!   independent of storage (a getter may be declared or not).

use crate::collection::EntityCollection;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::rc::Rc;
use uuid::Uuid;

/// Stable primary key of a persisted entity.
pub type EntityId = Uuid;

/// Shape of a stored field, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Association,
    Collection,
}

/// Single-valued association to another entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAssociation {
    target_kind: String,
    target: Option<EntityRef>,
}

impl EntityAssociation {
    /// Creates an empty association pointing at entities of `target_kind`.
    pub fn new(target_kind: impl Into<String>) -> Self {
        Self {
            target_kind: target_kind.into(),
            target: None,
        }
    }

    /// Creates an association already holding `target`.
    pub fn to(target: EntityRef) -> Self {
        Self {
            target_kind: target.kind().to_string(),
            target: Some(target),
        }
    }

    pub fn target_kind(&self) -> &str {
        &self.target_kind
    }

    pub fn target(&self) -> Option<&EntityRef> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Option<EntityRef>) {
        self.target = target;
    }
}

/// Value stored in one named field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain data copied as-is at the API boundary.
    Scalar(Value),
    /// To-one association.
    Association(EntityAssociation),
    /// To-many association, mutated in place by reconciliation.
    Collection(EntityCollection),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar(_) => FieldKind::Scalar,
            Self::Association(_) => FieldKind::Association,
            Self::Collection(_) => FieldKind::Collection,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<EntityCollection> for FieldValue {
    fn from(value: EntityCollection) -> Self {
        Self::Collection(value)
    }
}

impl From<EntityAssociation> for FieldValue {
    fn from(value: EntityAssociation) -> Self {
        Self::Association(value)
    }
}

/// Domain object participating in hydration.
///
/// A transient entity has no primary key yet; it can still live in
/// collections and is then identified by its handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    kind: String,
    id: Option<EntityId>,
    fields: BTreeMap<String, FieldValue>,
    accessors: BTreeSet<String>,
}

impl Entity {
    /// Creates a transient entity of `kind` with no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            fields: BTreeMap::new(),
            accessors: BTreeSet::new(),
        }
    }

    /// Creates a persisted entity with a caller-provided primary key.
    pub fn with_id(kind: impl Into<String>, id: EntityId) -> Self {
        let mut entity = Self::new(kind);
        entity.id = Some(id);
        entity
    }

    /// Adds one field to storage.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Declares one accessor method name, e.g. `getTags`.
    pub fn with_accessor(mut self, name: impl Into<String>) -> Self {
        self.accessors.insert(name.into());
        self
    }

    /// Declares the conventional getter and setter for `field`.
    pub fn with_accessors_for(self, field: &str) -> Self {
        self.with_accessor(crate::access::getter_name(field))
            .with_accessor(crate::access::setter_name(field))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Returns whether this entity carries a primary key.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    /// Replaces (or creates) field storage for `name`.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Iterates stored fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.contains(name)
    }

    /// Moves this entity behind a shared handle.
    pub fn into_ref(self) -> EntityRef {
        EntityRef::new(self)
    }
}

/// Shared handle to an entity.
///
/// Equality is handle equality: two handles are equal only when they point
/// at the same allocation, regardless of field values.
#[derive(Clone)]
pub struct EntityRef(Rc<Entity>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Rc::new(entity))
    }

    /// Returns whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared allocation; stable while any handle is alive.
    pub fn handle_address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Deref for EntityRef {
    type Target = Entity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("kind", &self.0.kind)
            .field("id", &self.0.id)
            .finish()
    }
}
