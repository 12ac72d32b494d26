//! Hydrators: entity <-> plain data conversion.
//!
//! # Responsibility
//! - Define the `Hydrator` contract used at API boundaries.
//! - Resolve incoming entity references (ids) into live handles.
//! - Split extraction and hydration across two services when configured.
//!
//! # Invariants
//! - Reference resolution completes before any collection is mutated.
//! - Hydration applies fields one at a time; an error stops at the failing
//!   field and leaves that field unchanged.

pub mod object;

use crate::access::AccessError;
use crate::model::entity::{Entity, EntityId, EntityRef};
use crate::model::store::EntityResolver;
use crate::reconcile::ReconcileError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub use object::ObjectHydrator;

/// Hydration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrateError {
    /// Structural or reconciliation failure on one field.
    Reconcile(ReconcileError),
    /// Incoming value is not a usable entity reference.
    InvalidReference {
        field: String,
        index: Option<usize>,
        reason: String,
    },
    /// Reference is well-formed but no such entity exists.
    UnresolvedReference {
        field: String,
        kind: String,
        id: EntityId,
    },
    /// Incoming value has the wrong JSON shape for the field.
    TypeMismatch { field: String, expected: &'static str },
}

impl Display for HydrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reconcile(err) => write!(f, "{err}"),
            Self::InvalidReference {
                field,
                index: Some(index),
                reason,
            } => write!(f, "invalid reference in `{field}` at index {index}: {reason}"),
            Self::InvalidReference {
                field,
                index: None,
                reason,
            } => write!(f, "invalid reference in `{field}`: {reason}"),
            Self::UnresolvedReference { field, kind, id } => {
                write!(f, "unresolved reference in `{field}`: {kind}#{id}")
            }
            Self::TypeMismatch { field, expected } => {
                write!(f, "field `{field}` expects {expected}")
            }
        }
    }
}

impl Error for HydrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Reconcile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReconcileError> for HydrateError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

impl From<AccessError> for HydrateError {
    fn from(value: AccessError) -> Self {
        Self::Reconcile(ReconcileError::Access(value))
    }
}

/// Converts entities to plain data and back.
pub trait Hydrator {
    fn extract(&self, object: &Entity) -> Result<Map<String, Value>, HydrateError>;

    fn hydrate(
        &self,
        data: &Map<String, Value>,
        object: &mut Entity,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError>;
}

/// Hydrator routing extraction and hydration to separate services.
#[derive(Clone)]
pub struct DelegatingHydrator {
    extract_service: Arc<dyn Hydrator>,
    hydrate_service: Arc<dyn Hydrator>,
}

impl DelegatingHydrator {
    pub fn new(extract_service: Arc<dyn Hydrator>, hydrate_service: Arc<dyn Hydrator>) -> Self {
        Self {
            extract_service,
            hydrate_service,
        }
    }

    /// Uses one service for both directions.
    pub fn shared(service: Arc<dyn Hydrator>) -> Self {
        Self::new(service.clone(), service)
    }
}

impl Hydrator for DelegatingHydrator {
    fn extract(&self, object: &Entity) -> Result<Map<String, Value>, HydrateError> {
        self.extract_service.extract(object)
    }

    fn hydrate(
        &self,
        data: &Map<String, Value>,
        object: &mut Entity,
        resolver: &dyn EntityResolver,
    ) -> Result<(), HydrateError> {
        self.hydrate_service.hydrate(data, object, resolver)
    }
}

/// Resolves an array of references into entity handles of `kind`.
///
/// `null` is read as an empty list. Items are id strings or objects with an
/// `"id"` key. Every item is resolved before returning.
pub fn resolve_references(
    field: &str,
    kind: &str,
    value: &Value,
    resolver: &dyn EntityResolver,
) -> Result<Vec<EntityRef>, HydrateError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => {
            return Err(HydrateError::TypeMismatch {
                field: field.to_string(),
                expected: "an array of entity references",
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_reference(field, Some(index), kind, item, resolver))
        .collect()
}

/// Resolves one reference into an entity handle of `kind`.
pub fn resolve_reference(
    field: &str,
    index: Option<usize>,
    kind: &str,
    value: &Value,
    resolver: &dyn EntityResolver,
) -> Result<EntityRef, HydrateError> {
    let id = parse_reference_id(value).map_err(|reason| HydrateError::InvalidReference {
        field: field.to_string(),
        index,
        reason,
    })?;
    resolver
        .find(kind, id)
        .ok_or_else(|| HydrateError::UnresolvedReference {
            field: field.to_string(),
            kind: kind.to_string(),
            id,
        })
}

fn parse_reference_id(value: &Value) -> Result<EntityId, String> {
    let raw = match value {
        Value::String(raw) => raw.as_str(),
        Value::Object(object) => match object.get("id") {
            Some(Value::String(raw)) => raw.as_str(),
            Some(other) => return Err(format!("`id` must be a string, got {other}")),
            None => return Err("object reference has no `id` key".to_string()),
        },
        other => return Err(format!("expected id string or object, got {other}")),
    };
    Uuid::parse_str(raw.trim()).map_err(|err| format!("malformed id `{raw}`: {err}"))
}
