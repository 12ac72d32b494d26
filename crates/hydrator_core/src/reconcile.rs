//! Collection reconciliation.
//!
//! # Responsibility
//! - Compute the add/remove delta between a live collection and a desired
//!   membership, by identity.
//! - Apply that delta to the live collection in place.
//!
//! # Invariants
//! - Every `to_add` element is desired and absent (by identity) from the
//!   pre-reconciliation snapshot; every `to_remove` element is in the
//!   snapshot and absent (by identity) from the desired list.
//! - Identities present on both sides are untouched.
//! - Removals are applied in snapshot order, then additions in desired order.
//! - Every failure is detected before the first mutation.
//! - No state survives between calls.
//!
//! Membership is tested through hashed identity keys, so one call costs
//! O(|current| + |desired|) instead of pairwise comparison.

use crate::access::{AccessError, FieldAccessor};
use crate::collection::{Collection, EntityCollection};
use crate::identity::{EntityIdentity, IdentityComparator};
use crate::model::entity::{Entity, EntityRef};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Handling of identities that appear more than once in one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first desired occurrence; surplus current copies are removed.
    #[default]
    Dedupe,
    /// Fail on the first repeated identity in the desired list.
    Reject,
}

/// Per-call reconciliation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// When `false`, only additions are applied.
    pub allow_remove: bool,
    pub duplicates: DuplicatePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            allow_remove: true,
            duplicates: DuplicatePolicy::default(),
        }
    }
}

/// Elements added to and removed from a collection by one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDelta<E> {
    pub to_add: Vec<E>,
    pub to_remove: Vec<E>,
}

impl<E> CollectionDelta<E> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

impl<E> Default for CollectionDelta<E> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

/// Reconciliation failure. Nothing has been mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    Access(AccessError),
    /// Desired element at `index` cannot live in the target collection.
    InvalidReference { index: usize, reason: String },
    /// Desired element at `index` repeats an earlier identity.
    DuplicateIdentity { index: usize },
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(err) => write!(f, "{err}"),
            Self::InvalidReference { index, reason } => {
                write!(f, "invalid entity reference at index {index}: {reason}")
            }
            Self::DuplicateIdentity { index } => {
                write!(f, "duplicate entity identity at index {index}")
            }
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Access(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AccessError> for ReconcileError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

/// Partitions `current` and `desired` into a delta by identity.
///
/// Does not touch any collection.
pub fn compute_delta<E, I>(
    current: &[E],
    desired: &[E],
    identity: &I,
    duplicates: DuplicatePolicy,
) -> Result<CollectionDelta<E>, ReconcileError>
where
    E: Clone,
    I: IdentityComparator<E> + ?Sized,
{
    let mut desired_keys = HashSet::with_capacity(desired.len());
    let mut wanted = Vec::with_capacity(desired.len());
    for (index, element) in desired.iter().enumerate() {
        let key = identity.identity(element);
        if desired_keys.insert(key.clone()) {
            wanted.push((element, key));
        } else if duplicates == DuplicatePolicy::Reject {
            return Err(ReconcileError::DuplicateIdentity { index });
        }
    }

    let current_keys: Vec<I::Key> = current
        .iter()
        .map(|element| identity.identity(element))
        .collect();
    let present: HashSet<&I::Key> = current_keys.iter().collect();

    let mut kept = HashSet::with_capacity(current.len());
    let mut to_remove = Vec::new();
    for (element, key) in current.iter().zip(&current_keys) {
        // Second and later copies of a kept identity are surplus.
        if !desired_keys.contains(key) || !kept.insert(key) {
            to_remove.push(element.clone());
        }
    }

    let to_add = wanted
        .into_iter()
        .filter(|(_, key)| !present.contains(key))
        .map(|(element, _)| element.clone())
        .collect();

    Ok(CollectionDelta { to_add, to_remove })
}

/// Applies removals, then additions, to `collection`.
///
/// Removals match members by `identity`, never by value equality.
pub fn apply_delta<E, C, I>(collection: &mut C, delta: &CollectionDelta<E>, identity: &I)
where
    E: Clone,
    C: Collection<E> + ?Sized,
    I: IdentityComparator<E> + ?Sized,
{
    let same = |a: &E, b: &E| identity.same(a, b);
    for element in &delta.to_remove {
        collection.remove_identical(element, &same);
    }
    for element in &delta.to_add {
        collection.add(element.clone());
    }
}

/// Brings `collection` membership to `desired`, in place.
///
/// Returns the applied delta. On error the collection is unchanged.
pub fn reconcile_collection<E, C, I>(
    collection: &mut C,
    desired: &[E],
    identity: &I,
    options: ReconcileOptions,
) -> Result<CollectionDelta<E>, ReconcileError>
where
    E: Clone,
    C: Collection<E> + ?Sized,
    I: IdentityComparator<E> + ?Sized,
{
    for (index, element) in desired.iter().enumerate() {
        collection
            .check_element(element)
            .map_err(|reason| ReconcileError::InvalidReference { index, reason })?;
    }

    let snapshot = collection.to_list();
    let mut delta = compute_delta(&snapshot, desired, identity, options.duplicates)?;
    if !options.allow_remove {
        delta.to_remove.clear();
    }

    apply_delta(collection, &delta, identity);
    debug!(
        "event=collection_reconcile module=reconcile status=ok current={} desired={} added={} removed={}",
        snapshot.len(),
        desired.len(),
        delta.to_add.len(),
        delta.to_remove.len()
    );
    Ok(delta)
}

/// Live collection after reconciliation, plus what changed.
#[derive(Debug)]
pub struct Reconciled<'a> {
    /// The parent's own collection instance.
    pub collection: &'a mut EntityCollection,
    pub delta: CollectionDelta<EntityRef>,
}

/// Reconciles named collection fields of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReconciler {
    accessor: FieldAccessor,
    identity: EntityIdentity,
    options: ReconcileOptions,
}

impl CollectionReconciler {
    pub fn new(accessor: FieldAccessor) -> Self {
        Self {
            accessor,
            identity: EntityIdentity::default(),
            options: ReconcileOptions::default(),
        }
    }

    pub fn by_value() -> Self {
        Self::new(FieldAccessor::ByValue)
    }

    pub fn by_reference() -> Self {
        Self::new(FieldAccessor::ByReference)
    }

    pub fn with_identity(mut self, identity: EntityIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn accessor(&self) -> FieldAccessor {
        self.accessor
    }

    pub fn identity(&self) -> EntityIdentity {
        self.identity
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Reconciles `parent.<field>` against `desired`.
    ///
    /// # Errors
    /// - `Access(MissingAccessor)` in by-value mode without `get<Field>`.
    /// - `Access(FieldNotFound)` / `Access(NotACollection)` for bad fields.
    /// - `InvalidReference` when a desired entity has the wrong kind.
    /// - `DuplicateIdentity` under `DuplicatePolicy::Reject`.
    pub fn reconcile<'a>(
        &self,
        parent: &'a mut Entity,
        field: &str,
        desired: &[EntityRef],
    ) -> Result<Reconciled<'a>, ReconcileError> {
        let collection = self.accessor.collection_mut(parent, field)?;
        let delta =
            reconcile_collection(&mut *collection, desired, &self.identity, self.options)?;
        debug!(
            "event=field_reconcile module=reconcile status=ok field={} mode={} identity={}",
            field,
            self.accessor.as_str(),
            self.identity.as_str()
        );
        Ok(Reconciled { collection, delta })
    }
}
