use hydrator_core::{
    reconcile_collection, AccessError, Collection, CollectionReconciler, DuplicatePolicy, Entity,
    EntityCollection, EntityIdentity, EntityRef, FieldValue, ReconcileError, ReconcileOptions,
    ReferenceIdentity,
};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Add(Option<Uuid>),
    Remove(Option<Uuid>),
}

/// Entity collection that records every mutation call.
struct RecordingCollection {
    inner: EntityCollection,
    ops: Vec<Op>,
}

impl RecordingCollection {
    fn new(items: Vec<EntityRef>) -> Self {
        Self {
            inner: EntityCollection::with_items("tag", items),
            ops: Vec::new(),
        }
    }
}

impl Collection<EntityRef> for RecordingCollection {
    fn to_list(&self) -> Vec<EntityRef> {
        self.inner.to_list()
    }

    fn add(&mut self, element: EntityRef) {
        self.ops.push(Op::Add(element.id()));
        self.inner.add(element);
    }

    fn remove(&mut self, element: &EntityRef) -> bool {
        self.ops.push(Op::Remove(element.id()));
        self.inner.remove(element)
    }

    fn check_element(&self, element: &EntityRef) -> Result<(), String> {
        self.inner.check_element(element)
    }
}

fn tag() -> EntityRef {
    Entity::with_id("tag", Uuid::new_v4()).into_ref()
}

fn id_of(entity: &EntityRef) -> Option<Uuid> {
    entity.id()
}

fn article_with_tags(tags: Vec<EntityRef>) -> Entity {
    Entity::new("article")
        .with_field("title", json!("hello"))
        .with_field("tags", EntityCollection::with_items("tag", tags))
}

fn tags_of(article: &Entity) -> &EntityCollection {
    match article.field("tags") {
        Some(FieldValue::Collection(collection)) => collection,
        other => panic!("tags should be a collection, got {other:?}"),
    }
}

#[test]
fn replaces_a_with_c_removing_before_adding() {
    let a = tag();
    let b = tag();
    let c = tag();
    let mut collection = RecordingCollection::new(vec![a.clone(), b.clone()]);

    let delta = reconcile_collection(
        &mut collection,
        &[b.clone(), c.clone()],
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("reconcile should succeed");

    assert_eq!(delta.to_remove, vec![a.clone()]);
    assert_eq!(delta.to_add, vec![c.clone()]);
    assert_eq!(collection.ops, vec![Op::Remove(id_of(&a)), Op::Add(id_of(&c))]);
    assert!(collection.inner.contains(&b));
    assert!(collection.inner.contains(&c));
    assert!(!collection.inner.contains(&a));
    assert_eq!(collection.inner.len(), 2);
}

#[test]
fn second_call_with_same_desired_is_a_no_op() {
    let a = tag();
    let b = tag();
    let c = tag();
    let mut collection = RecordingCollection::new(vec![a]);
    let desired = vec![b, c];

    reconcile_collection(
        &mut collection,
        &desired,
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("first reconcile should succeed");
    let ops_after_first = collection.ops.len();

    let delta = reconcile_collection(
        &mut collection,
        &desired,
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("second reconcile should succeed");

    assert!(delta.is_empty());
    assert_eq!(collection.ops.len(), ops_after_first);
}

#[test]
fn equal_membership_in_any_order_touches_nothing() {
    let a = tag();
    let b = tag();
    let c = tag();
    let mut collection = RecordingCollection::new(vec![a.clone(), b.clone(), c.clone()]);

    let delta = reconcile_collection(
        &mut collection,
        &[c, a, b],
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("reconcile should succeed");

    assert!(delta.is_empty());
    assert!(collection.ops.is_empty());
}

#[test]
fn disjoint_sets_replace_everything() {
    let current = vec![tag(), tag()];
    let desired = vec![tag(), tag(), tag()];
    let mut collection = RecordingCollection::new(current.clone());

    let delta = reconcile_collection(
        &mut collection,
        &desired,
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("reconcile should succeed");

    assert_eq!(delta.to_remove, current);
    assert_eq!(delta.to_add, desired);
    assert_eq!(collection.inner.to_list(), desired);
}

#[test]
fn final_membership_ignores_desired_order() {
    let a = tag();
    let b = tag();
    let c = tag();

    let mut forward = RecordingCollection::new(vec![a.clone()]);
    reconcile_collection(
        &mut forward,
        &[b.clone(), c.clone()],
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("forward reconcile should succeed");

    let mut backward = RecordingCollection::new(vec![a]);
    reconcile_collection(
        &mut backward,
        &[c.clone(), b.clone()],
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect("backward reconcile should succeed");

    for member in [&b, &c] {
        assert!(forward.inner.contains(member));
        assert!(backward.inner.contains(member));
    }
    assert_eq!(forward.inner.len(), backward.inner.len());
}

#[test]
fn reconciler_mutates_parent_collection_in_place() {
    let a = tag();
    let b = tag();
    let c = tag();
    let mut article = article_with_tags(vec![a.clone(), b.clone()]);

    let reconciled = CollectionReconciler::by_reference()
        .reconcile(&mut article, "tags", &[b.clone(), c.clone()])
        .expect("reconcile should succeed");
    assert_eq!(reconciled.delta.to_remove, vec![a]);
    assert_eq!(reconciled.delta.to_add, vec![c.clone()]);
    assert_eq!(reconciled.collection.len(), 2);

    let tags = tags_of(&article);
    assert!(tags.contains(&b));
    assert!(tags.contains(&c));
}

#[test]
fn by_value_without_getter_fails_before_touching_collection() {
    let a = tag();
    let mut article = article_with_tags(vec![a.clone()]);

    let err = CollectionReconciler::by_value()
        .reconcile(&mut article, "tags", &[tag()])
        .expect_err("missing getter must fail");
    assert_eq!(
        err,
        ReconcileError::Access(AccessError::MissingAccessor {
            kind: "article".to_string(),
            field: "tags".to_string(),
            getter: "getTags".to_string(),
        })
    );

    let tags = tags_of(&article);
    assert_eq!(tags.len(), 1);
    assert!(tags.contains(&a));
}

#[test]
fn by_value_with_getter_reconciles() {
    let c = tag();
    let mut article = article_with_tags(vec![tag()]).with_accessor("getTags");

    CollectionReconciler::by_value()
        .reconcile(&mut article, "tags", &[c.clone()])
        .expect("declared getter should allow reconcile");

    assert_eq!(tags_of(&article).to_list(), vec![c]);
}

#[test]
fn by_reference_reports_unknown_field() {
    let mut article = article_with_tags(vec![]);
    let err = CollectionReconciler::by_reference()
        .reconcile(&mut article, "labels", &[])
        .expect_err("unknown field must fail");
    assert!(matches!(
        err,
        ReconcileError::Access(AccessError::FieldNotFound { .. })
    ));

    let err = CollectionReconciler::by_reference()
        .reconcile(&mut article, "title", &[])
        .expect_err("scalar field must fail");
    assert!(matches!(
        err,
        ReconcileError::Access(AccessError::NotACollection { .. })
    ));
}

#[test]
fn wrong_kind_reference_fails_without_partial_mutation() {
    let a = tag();
    let user = Entity::with_id("user", Uuid::new_v4()).into_ref();
    let mut collection = RecordingCollection::new(vec![a.clone()]);

    let err = reconcile_collection(
        &mut collection,
        &[tag(), user],
        &ReferenceIdentity,
        ReconcileOptions::default(),
    )
    .expect_err("foreign kind must fail");

    assert!(matches!(
        err,
        ReconcileError::InvalidReference { index: 1, .. }
    ));
    assert!(collection.ops.is_empty());
    assert_eq!(collection.inner.to_list(), vec![a]);
}

#[test]
fn duplicate_rejection_fails_without_partial_mutation() {
    let a = tag();
    let b = tag();
    let mut collection = RecordingCollection::new(vec![a]);
    let options = ReconcileOptions {
        duplicates: DuplicatePolicy::Reject,
        ..ReconcileOptions::default()
    };

    let err = reconcile_collection(
        &mut collection,
        &[b.clone(), b],
        &ReferenceIdentity,
        options,
    )
    .expect_err("duplicate must fail");

    assert_eq!(err, ReconcileError::DuplicateIdentity { index: 1 });
    assert!(collection.ops.is_empty());
}

#[test]
fn primary_key_identity_keeps_existing_handle_for_reloaded_record() {
    let id = Uuid::new_v4();
    let stored = Entity::with_id("tag", id).into_ref();
    let reloaded = Entity::with_id("tag", id).into_ref();
    let mut article = article_with_tags(vec![stored.clone()]);

    let reconciled = CollectionReconciler::by_reference()
        .with_identity(EntityIdentity::PrimaryKey)
        .reconcile(&mut article, "tags", &[reloaded.clone()])
        .expect("reconcile should succeed");
    assert!(reconciled.delta.is_empty());
    assert!(tags_of(&article).contains(&stored));

    let reconciled = CollectionReconciler::by_reference()
        .reconcile(&mut article, "tags", &[reloaded.clone()])
        .expect("reconcile should succeed");
    assert_eq!(reconciled.delta.to_remove, vec![stored]);
    assert_eq!(reconciled.delta.to_add, vec![reloaded]);
}
