//! Mutable association collections.
//!
//! # Responsibility
//! - Define the capability set reconciliation needs from a live collection.
//! - Provide the ordered entity collection owned by a parent entity.
//!
//! # Invariants
//! - `EntityCollection::remove` matches by handle, never by value.
//! - `EntityCollection` only accepts entities of its declared target kind.

use crate::model::entity::{EntityId, EntityRef};

/// Live collection capability used by the reconciler.
pub trait Collection<E> {
    /// Snapshot of current membership, in collection order.
    fn to_list(&self) -> Vec<E>;

    fn add(&mut self, element: E);

    /// Removes one element; returns `false` when it was not present.
    fn remove(&mut self, element: &E) -> bool;

    /// Removes the member `same` identifies with `element`.
    ///
    /// Reconciliation removes through this method. The default delegates to
    /// `remove`, which is only correct when `remove` already matches by
    /// identity; collections whose `remove` matches by value must override.
    fn remove_identical(&mut self, element: &E, _same: &dyn Fn(&E, &E) -> bool) -> bool {
        self.remove(element)
    }

    /// Shape check for an element about to be added.
    ///
    /// Returns the rejection reason for elements this collection cannot hold.
    fn check_element(&self, _element: &E) -> Result<(), String> {
        Ok(())
    }
}

impl<E: Clone + PartialEq> Collection<E> for Vec<E> {
    fn to_list(&self) -> Vec<E> {
        self.clone()
    }

    fn add(&mut self, element: E) {
        self.push(element);
    }

    fn remove(&mut self, element: &E) -> bool {
        match self.iter().position(|item| item == element) {
            Some(index) => {
                Vec::remove(self, index);
                true
            }
            None => false,
        }
    }

    // Value equality alone may pick a different handle with an equal payload.
    fn remove_identical(&mut self, element: &E, same: &dyn Fn(&E, &E) -> bool) -> bool {
        let index = self
            .iter()
            .position(|item| same(item, element) && item == element)
            .or_else(|| self.iter().position(|item| same(item, element)));
        match index {
            Some(index) => {
                Vec::remove(self, index);
                true
            }
            None => false,
        }
    }
}

/// Ordered to-many association holding entity handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCollection {
    target_kind: String,
    items: Vec<EntityRef>,
}

impl EntityCollection {
    /// Creates an empty collection of `target_kind` entities.
    pub fn new(target_kind: impl Into<String>) -> Self {
        Self {
            target_kind: target_kind.into(),
            items: Vec::new(),
        }
    }

    /// Creates a collection with initial members.
    ///
    /// Members are taken as-is; kind checks apply to later additions through
    /// reconciliation.
    pub fn with_items(target_kind: impl Into<String>, items: Vec<EntityRef>) -> Self {
        Self {
            target_kind: target_kind.into(),
            items,
        }
    }

    pub fn target_kind(&self) -> &str {
        &self.target_kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter()
    }

    /// Returns whether this exact handle is a member.
    pub fn contains(&self, element: &EntityRef) -> bool {
        self.items.iter().any(|item| item.ptr_eq(element))
    }

    /// Primary keys of members in collection order (`None` for transient).
    pub fn ids(&self) -> Vec<Option<EntityId>> {
        self.items.iter().map(|item| item.id()).collect()
    }
}

impl Collection<EntityRef> for EntityCollection {
    fn to_list(&self) -> Vec<EntityRef> {
        self.items.clone()
    }

    fn add(&mut self, element: EntityRef) {
        self.items.push(element);
    }

    fn remove(&mut self, element: &EntityRef) -> bool {
        match self.items.iter().position(|item| item.ptr_eq(element)) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn check_element(&self, element: &EntityRef) -> Result<(), String> {
        if element.kind() != self.target_kind {
            return Err(format!(
                "expected `{}` entity, got `{}`",
                self.target_kind,
                element.kind()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, EntityCollection};
    use crate::model::entity::Entity;
    use uuid::Uuid;

    #[test]
    fn remove_matches_handle_not_value() {
        let id = Uuid::new_v4();
        let member = Entity::with_id("tag", id).into_ref();
        let lookalike = Entity::with_id("tag", id).into_ref();
        let mut collection = EntityCollection::with_items("tag", vec![member.clone()]);

        assert!(!collection.remove(&lookalike));
        assert_eq!(collection.len(), 1);
        assert!(collection.remove(&member));
        assert!(collection.is_empty());
    }

    #[test]
    fn add_appends_in_order() {
        let first = Entity::new("tag").into_ref();
        let second = Entity::new("tag").into_ref();
        let mut collection = EntityCollection::new("tag");

        collection.add(first.clone());
        collection.add(second.clone());

        let members = collection.to_list();
        assert!(members[0].ptr_eq(&first));
        assert!(members[1].ptr_eq(&second));
    }

    #[test]
    fn check_element_rejects_foreign_kind() {
        let collection = EntityCollection::new("tag");
        let user = Entity::new("user").into_ref();

        let reason = collection
            .check_element(&user)
            .expect_err("foreign kind must be rejected");
        assert!(reason.contains("`tag`"));
        assert!(collection
            .check_element(&Entity::new("tag").into_ref())
            .is_ok());
    }

    #[test]
    fn vec_collection_removes_first_equal_value() {
        let mut values = vec![1, 2, 1];
        assert!(Collection::remove(&mut values, &1));
        assert_eq!(values, vec![2, 1]);
        assert!(!Collection::remove(&mut values, &9));
    }
}
