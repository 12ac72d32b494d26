//! Entity lookup capability and in-memory implementation.
//!
//! The hydrator never loads entities itself. Incoming plain data carries
//! primary keys; an `EntityResolver` turns them back into live handles.

use crate::model::entity::{Entity, EntityId, EntityRef};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Looks up live entity handles by kind and primary key.
pub trait EntityResolver {
    fn find(&self, kind: &str, id: EntityId) -> Option<EntityRef>;
}

/// In-memory store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Only persisted entities can be indexed by key.
    MissingId(String),
    DuplicateEntity { kind: String, id: EntityId },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId(kind) => write!(f, "cannot store transient `{kind}` entity"),
            Self::DuplicateEntity { kind, id } => {
                write!(f, "entity already stored: {kind}#{id}")
            }
        }
    }
}

impl Error for StoreError {}

/// Keyed in-memory entity map.
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: BTreeMap<(String, EntityId), EntityRef>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one persisted entity and returns its shared handle.
    pub fn insert(&mut self, entity: Entity) -> Result<EntityRef, StoreError> {
        let handle = entity.into_ref();
        self.insert_ref(handle.clone())?;
        Ok(handle)
    }

    /// Stores an existing handle so later lookups return the same identity.
    pub fn insert_ref(&mut self, handle: EntityRef) -> Result<(), StoreError> {
        let id = handle
            .id()
            .ok_or_else(|| StoreError::MissingId(handle.kind().to_string()))?;
        let key = (handle.kind().to_string(), id);
        if self.entries.contains_key(&key) {
            return Err(StoreError::DuplicateEntity { kind: key.0, id });
        }
        self.entries.insert(key, handle);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntityResolver for EntityStore {
    fn find(&self, kind: &str, id: EntityId) -> Option<EntityRef> {
        self.entries.get(&(kind.to_string(), id)).cloned()
    }
}
