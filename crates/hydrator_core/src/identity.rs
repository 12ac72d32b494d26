//! Identity comparison for collection elements.
//!
//! # Responsibility
//! - Decide whether two element values denote the same underlying record.
//! - Expose a hashable, totally ordered identity key so membership tests
//!   run in constant time.
//!
//! # Invariants
//! - Comparison never fails and has no side effects.
//! - `compare` is a total order derived from the key; `same(a, b)` holds
//!   exactly when `compare(a, b) == Ordering::Equal`.
//! - Identity is never field-by-value equality.

use crate::model::entity::{EntityId, EntityRef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Derives a stable identity key for elements of type `E`.
pub trait IdentityComparator<E> {
    type Key: Ord + Hash + Clone + Debug;

    fn identity(&self, element: &E) -> Self::Key;

    fn same(&self, a: &E, b: &E) -> bool {
        self.identity(a) == self.identity(b)
    }

    fn compare(&self, a: &E, b: &E) -> Ordering {
        self.identity(a).cmp(&self.identity(b))
    }
}

/// Identity by shared allocation.
///
/// Two handles are the same only if they point at the same allocation. Two
/// separately loaded copies of one persisted record count as different
/// elements; use `PrimaryKeyIdentity` when that matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceIdentity;

impl<T: ?Sized> IdentityComparator<Rc<T>> for ReferenceIdentity {
    type Key = usize;

    fn identity(&self, element: &Rc<T>) -> usize {
        Rc::as_ptr(element).cast::<()>() as usize
    }
}

impl<T: ?Sized> IdentityComparator<Arc<T>> for ReferenceIdentity {
    type Key = usize;

    fn identity(&self, element: &Arc<T>) -> usize {
        Arc::as_ptr(element).cast::<()>() as usize
    }
}

impl IdentityComparator<EntityRef> for ReferenceIdentity {
    type Key = usize;

    fn identity(&self, element: &EntityRef) -> usize {
        element.handle_address()
    }
}

/// Identity token for entity handles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentityToken {
    /// Address of the shared allocation.
    Handle(usize),
    /// Entity kind plus primary key.
    Primary { kind: String, id: EntityId },
}

/// Identity by `(kind, primary key)`.
///
/// Transient entities have no key yet and fall back to handle identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimaryKeyIdentity;

impl IdentityComparator<EntityRef> for PrimaryKeyIdentity {
    type Key = IdentityToken;

    fn identity(&self, element: &EntityRef) -> IdentityToken {
        match element.id() {
            Some(id) => IdentityToken::Primary {
                kind: element.kind().to_string(),
                id,
            },
            None => IdentityToken::Handle(element.handle_address()),
        }
    }
}

/// Entity identity mode selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityIdentity {
    #[default]
    Reference,
    PrimaryKey,
}

impl EntityIdentity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::PrimaryKey => "primary_key",
        }
    }
}

impl IdentityComparator<EntityRef> for EntityIdentity {
    type Key = IdentityToken;

    fn identity(&self, element: &EntityRef) -> IdentityToken {
        match self {
            Self::Reference => IdentityToken::Handle(element.handle_address()),
            Self::PrimaryKey => PrimaryKeyIdentity.identity(element),
        }
    }
}

/// Identity from a caller-supplied key extractor.
pub struct KeyFn<F, K> {
    extract: F,
    _key: PhantomData<fn() -> K>,
}

impl<F, K> KeyFn<F, K> {
    pub fn new(extract: F) -> Self {
        Self {
            extract,
            _key: PhantomData,
        }
    }
}

impl<E, F, K> IdentityComparator<E> for KeyFn<F, K>
where
    F: Fn(&E) -> K,
    K: Ord + Hash + Clone + Debug,
{
    type Key = K;

    fn identity(&self, element: &E) -> K {
        (self.extract)(element)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EntityIdentity, IdentityComparator, IdentityToken, KeyFn, PrimaryKeyIdentity,
        ReferenceIdentity,
    };
    use crate::model::entity::Entity;
    use std::cmp::Ordering;
    use std::rc::Rc;
    use uuid::Uuid;

    #[test]
    fn reference_identity_distinguishes_equal_values() {
        let a = Rc::new(7_u32);
        let b = Rc::new(7_u32);

        assert!(ReferenceIdentity.same(&a, &a.clone()));
        assert!(!ReferenceIdentity.same(&a, &b));
        assert_eq!(ReferenceIdentity.compare(&a, &a), Ordering::Equal);
        assert_eq!(
            ReferenceIdentity.compare(&a, &b),
            ReferenceIdentity.compare(&b, &a).reverse()
        );
    }

    #[test]
    fn primary_key_identity_matches_separately_loaded_copies() {
        let id = Uuid::new_v4();
        let loaded_once = Entity::with_id("tag", id).into_ref();
        let loaded_twice = Entity::with_id("tag", id).into_ref();

        assert!(PrimaryKeyIdentity.same(&loaded_once, &loaded_twice));
        assert!(!ReferenceIdentity.same(&loaded_once, &loaded_twice));
        assert!(!EntityIdentity::Reference.same(&loaded_once, &loaded_twice));
        assert!(EntityIdentity::PrimaryKey.same(&loaded_once, &loaded_twice));
    }

    #[test]
    fn primary_key_identity_separates_kinds_with_same_key() {
        let id = Uuid::new_v4();
        let tag = Entity::with_id("tag", id).into_ref();
        let user = Entity::with_id("user", id).into_ref();

        assert!(!PrimaryKeyIdentity.same(&tag, &user));
    }

    #[test]
    fn transient_entities_fall_back_to_handle_identity() {
        let draft = Entity::new("tag").into_ref();
        let other_draft = Entity::new("tag").into_ref();

        assert_eq!(
            PrimaryKeyIdentity.identity(&draft),
            IdentityToken::Handle(draft.handle_address())
        );
        assert!(PrimaryKeyIdentity.same(&draft, &draft.clone()));
        assert!(!PrimaryKeyIdentity.same(&draft, &other_draft));
    }

    #[test]
    fn key_fn_uses_extracted_key() {
        let by_len: KeyFn<_, usize> = KeyFn::new(|value: &String| value.len());
        assert!(by_len.same(&"abc".to_string(), &"xyz".to_string()));
        assert_eq!(
            by_len.compare(&"a".to_string(), &"bb".to_string()),
            Ordering::Less
        );
    }

    #[test]
    fn identity_mode_deserializes_from_snake_case() {
        let mode: EntityIdentity =
            serde_json::from_str("\"primary_key\"").expect("mode should parse");
        assert_eq!(mode, EntityIdentity::PrimaryKey);
        assert_eq!(EntityIdentity::default().as_str(), "reference");
    }
}
