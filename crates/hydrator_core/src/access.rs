//! Field access modes.
//!
//! # Responsibility
//! - Resolve a named field of an entity to its live storage.
//! - Enforce the public accessor convention in by-value mode.
//!
//! # Invariants
//! - By-value access requires the conventional getter (`get` + capitalized
//!   field name) to be declared; missing getters fail before any mutation.
//! - By-reference access reads storage directly and ignores accessors.
//! - The returned collection is the parent's own instance, never a copy.

use crate::collection::EntityCollection;
use crate::model::entity::{Entity, FieldValue};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How a hydrator reaches field storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccessor {
    /// Through declared `get<Field>` / `set<Field>` accessors.
    ByValue,
    /// Directly through field storage, bypassing accessors.
    ByReference,
}

impl FieldAccessor {
    /// Maps the `by_value` configuration flag to an access mode.
    pub fn from_by_value(by_value: bool) -> Self {
        if by_value {
            Self::ByValue
        } else {
            Self::ByReference
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByValue => "by_value",
            Self::ByReference => "by_reference",
        }
    }

    /// Returns whether `field` may be read in this mode.
    pub fn is_readable(self, object: &Entity, field: &str) -> bool {
        match self {
            Self::ByValue => object.has_accessor(&getter_name(field)),
            Self::ByReference => object.field(field).is_some(),
        }
    }

    /// Returns whether `field` may be written in this mode.
    pub fn is_writable(self, object: &Entity, field: &str) -> bool {
        match self {
            Self::ByValue => object.has_accessor(&setter_name(field)),
            Self::ByReference => object.field(field).is_some(),
        }
    }

    /// Resolves `field` to the parent's collection for reading.
    pub fn collection<'a>(
        self,
        object: &'a Entity,
        field: &str,
    ) -> Result<&'a EntityCollection, AccessError> {
        self.require_getter(object, field)?;
        match object.field(field) {
            Some(FieldValue::Collection(collection)) => Ok(collection),
            Some(_) => Err(AccessError::NotACollection {
                kind: object.kind().to_string(),
                field: field.to_string(),
            }),
            None => Err(AccessError::FieldNotFound {
                kind: object.kind().to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Resolves `field` to the parent's live collection for mutation.
    pub fn collection_mut<'a>(
        self,
        object: &'a mut Entity,
        field: &str,
    ) -> Result<&'a mut EntityCollection, AccessError> {
        self.require_getter(object, field)?;
        let kind = object.kind().to_string();
        match object.field_mut(field) {
            Some(FieldValue::Collection(collection)) => Ok(collection),
            Some(_) => Err(AccessError::NotACollection {
                kind,
                field: field.to_string(),
            }),
            None => Err(AccessError::FieldNotFound {
                kind,
                field: field.to_string(),
            }),
        }
    }

    fn require_getter(self, object: &Entity, field: &str) -> Result<(), AccessError> {
        if self != Self::ByValue {
            return Ok(());
        }
        let getter = getter_name(field);
        if !object.has_accessor(&getter) {
            return Err(AccessError::MissingAccessor {
                kind: object.kind().to_string(),
                field: field.to_string(),
                getter,
            });
        }
        Ok(())
    }
}

/// Structural mismatch between an access mode and an entity's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// By-value mode and the conventional getter is not declared.
    MissingAccessor {
        kind: String,
        field: String,
        getter: String,
    },
    /// The named field has no storage on the entity.
    FieldNotFound { kind: String, field: String },
    /// The named field exists but does not hold a collection.
    NotACollection { kind: String, field: String },
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAccessor {
                kind,
                field,
                getter,
            } => write!(
                f,
                "the getter {getter} to access collection {field} in object {kind} does not exist"
            ),
            Self::FieldNotFound { kind, field } => {
                write!(f, "field {field} does not exist in object {kind}")
            }
            Self::NotACollection { kind, field } => {
                write!(f, "field {field} in object {kind} is not a collection")
            }
        }
    }
}

impl Error for AccessError {}

/// Conventional getter name: `tags` -> `getTags`.
pub fn getter_name(field: &str) -> String {
    format!("get{}", capitalize_first(field))
}

/// Conventional setter name: `tags` -> `setTags`.
pub fn setter_name(field: &str) -> String {
    format!("set{}", capitalize_first(field))
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{getter_name, setter_name, AccessError, FieldAccessor};
    use crate::collection::EntityCollection;
    use crate::model::entity::Entity;
    use serde_json::json;

    fn article() -> Entity {
        Entity::new("article")
            .with_field("tags", EntityCollection::new("tag"))
            .with_field("title", json!("draft"))
    }

    #[test]
    fn accessor_names_capitalize_first_char_only() {
        assert_eq!(getter_name("tags"), "getTags");
        assert_eq!(setter_name("createdAt"), "setCreatedAt");
        assert_eq!(getter_name(""), "get");
    }

    #[test]
    fn by_value_requires_declared_getter() {
        let mut object = article();
        let err = FieldAccessor::ByValue
            .collection_mut(&mut object, "tags")
            .expect_err("missing getter must fail");
        assert_eq!(
            err,
            AccessError::MissingAccessor {
                kind: "article".to_string(),
                field: "tags".to_string(),
                getter: "getTags".to_string(),
            }
        );
        assert!(err.to_string().contains("getTags"));

        let mut object = article().with_accessor("getTags");
        assert!(FieldAccessor::ByValue
            .collection_mut(&mut object, "tags")
            .is_ok());
    }

    #[test]
    fn by_reference_ignores_accessors_but_needs_storage() {
        let mut object = article();
        assert!(FieldAccessor::ByReference
            .collection_mut(&mut object, "tags")
            .is_ok());

        let err = FieldAccessor::ByReference
            .collection_mut(&mut object, "labels")
            .expect_err("unknown field must fail");
        assert!(matches!(err, AccessError::FieldNotFound { .. }));
    }

    #[test]
    fn scalar_field_is_not_a_collection() {
        let object = article();
        let err = FieldAccessor::ByReference
            .collection(&object, "title")
            .expect_err("scalar field must be rejected");
        assert!(matches!(err, AccessError::NotACollection { .. }));
    }

    #[test]
    fn readable_and_writable_follow_mode() {
        let object = article().with_accessor("getTitle");
        assert!(FieldAccessor::ByValue.is_readable(&object, "title"));
        assert!(!FieldAccessor::ByValue.is_writable(&object, "title"));
        assert!(FieldAccessor::ByReference.is_writable(&object, "title"));
        assert!(!FieldAccessor::ByReference.is_readable(&object, "missing"));
    }

    #[test]
    fn by_value_flag_maps_to_mode() {
        assert_eq!(FieldAccessor::from_by_value(true), FieldAccessor::ByValue);
        assert_eq!(
            FieldAccessor::from_by_value(false).as_str(),
            "by_reference"
        );
    }
}
