use docbridge_compare::JsonComparator;
use docbridge_model::{EntityKind, Model, ModelError, Property};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn order_model() -> Model {
    Model::builder()
        .kind(
            EntityKind::root("Order")
                .with_target("orders")
                .with_key("id")
                .with_field("total"),
        )
        .kind(EntityKind::owned("Address", "Order", "shippingAddress").with_field("city"))
        .kind(
            EntityKind::owned("Line", "Order", "lines")
                .collection()
                .with_field("sku"),
        )
        .kind(EntityKind::owned("Note", "Line", "note").with_field("text"))
        .build()
        .unwrap()
}

// ── Roots and ownership ──────────────────────────────────────────

#[test]
fn unowned_kind_is_document_root() {
    let model = order_model();
    assert!(model.is_document_root("Order").unwrap());
    assert!(!model.is_document_root("Address").unwrap());
    assert!(!model.is_document_root("Note").unwrap());
}

#[test]
fn owned_kind_with_target_is_its_own_root() {
    let model = Model::builder()
        .kind(EntityKind::root("Customer").with_target("customers").with_key("id"))
        .kind(
            EntityKind::owned("Profile", "Customer", "profile")
                .with_target("profiles")
                .with_key("id"),
        )
        .build()
        .unwrap();

    assert!(model.is_document_root("Profile").unwrap());
    assert_eq!(model.target_name("Profile").unwrap(), "profiles");
    assert!(model.embedded_kinds("Customer").unwrap().is_empty());
}

#[test]
fn ownership_depth_counts_hops() {
    let model = order_model();
    assert_eq!(model.ownership_depth("Order").unwrap(), 0);
    assert_eq!(model.ownership_depth("Line").unwrap(), 1);
    assert_eq!(model.ownership_depth("Note").unwrap(), 2);
    assert_eq!(model.max_ownership_depth(), 2);
}

#[test]
fn embedded_kinds_in_registration_order() {
    let model = order_model();
    let names: Vec<_> = model
        .embedded_kinds("Order")
        .unwrap()
        .into_iter()
        .map(|k| k.name.as_str())
        .collect();
    assert_eq!(names, vec!["Address", "Line"]);

    let line = model.ownership("Line").unwrap().unwrap();
    assert!(line.collection);
    assert_eq!(line.navigation, "lines");
}

// ── Targets ──────────────────────────────────────────────────────

#[test]
fn default_target_applies_to_unnamed_roots() {
    let model = Model::builder()
        .default_target("app")
        .kind(EntityKind::root("Blog").with_key("id"))
        .build()
        .unwrap();
    assert_eq!(model.target_name("Blog").unwrap(), "app");
}

#[test]
fn target_name_of_nested_kind_fails() {
    let model = order_model();
    assert_eq!(
        model.target_name("Address").unwrap_err(),
        ModelError::NotDocumentRoot {
            kind: "Address".into()
        }
    );
}

#[test]
fn root_without_target_is_rejected() {
    let err = Model::builder()
        .kind(EntityKind::root("Blog").with_key("id"))
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::MissingTargetName { kind: "Blog".into() });
}

// ── Configuration errors ─────────────────────────────────────────

#[test]
fn duplicate_kind_is_rejected() {
    let err = Model::builder()
        .default_target("app")
        .kind(EntityKind::root("Blog").with_key("id"))
        .kind(EntityKind::root("Blog").with_key("id"))
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::DuplicateKind("Blog".into()));
}

#[test]
fn unknown_principal_is_rejected() {
    let err = Model::builder()
        .kind(EntityKind::owned("Address", "Ghost", "address"))
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::UnknownKind("Ghost".into()));
}

#[test]
fn ownership_cycle_is_rejected() {
    let err = Model::builder()
        .kind(EntityKind::owned("A", "B", "b"))
        .kind(EntityKind::owned("B", "A", "a"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::OwnershipCycle { .. }));
}

#[test]
fn inheritance_cycle_is_rejected() {
    let err = Model::builder()
        .kind(EntityKind::derived("A", "B"))
        .kind(EntityKind::derived("B", "A"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ModelError::InheritanceCycle { .. }));
}

#[test]
fn root_without_key_is_rejected() {
    let err = Model::builder()
        .default_target("app")
        .kind(EntityKind::root("Blog").with_field("title"))
        .build()
        .unwrap_err();
    assert_eq!(err, ModelError::MissingKey { kind: "Blog".into() });
}

#[test]
fn json_name_collision_between_properties() {
    let err = Model::builder()
        .default_target("app")
        .kind(
            EntityKind::root("Blog")
                .with_key("id")
                .with_property(Property::new("title"))
                .with_property(Property::new("heading").with_json_name("title")),
        )
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::JsonPropertyCollision {
            kind: "Blog".into(),
            property: "heading".into(),
            other: "title".into(),
            json_name: "title".into(),
        }
    );
}

#[test]
fn json_name_collision_with_navigation() {
    let err = Model::builder()
        .default_target("app")
        .kind(EntityKind::root("Blog").with_key("id").with_field("owner"))
        .kind(EntityKind::owned("Person", "Blog", "owner"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::JsonPropertyCollision { ref json_name, .. } if json_name == "owner"
    ));
}

#[test]
fn derived_kind_cannot_set_target() {
    let err = Model::builder()
        .kind(
            EntityKind::root("Animal")
                .with_target("animals")
                .with_key("id")
                .with_discriminator("$type"),
        )
        .kind(EntityKind::derived("Cat", "Animal").with_target("cats"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::DerivedKindMapping { ref kind, ref root, .. } if kind == "Cat" && root == "Animal"
    ));
}

#[test]
fn discriminator_value_requires_property() {
    let err = Model::builder()
        .kind(EntityKind::root("Animal").with_target("animals").with_key("id"))
        .kind(EntityKind::derived("Cat", "Animal").with_discriminator_value("cat"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingDiscriminatorProperty { kind: "Cat".into() }
    );
}

// ── Hierarchies ──────────────────────────────────────────────────

fn animal_model() -> Model {
    Model::builder()
        .kind(
            EntityKind::root("Animal")
                .with_target("animals")
                .with_key("id")
                .with_field("name")
                .with_discriminator("$type")
                .with_discriminator_value("animal"),
        )
        .kind(
            EntityKind::derived("Cat", "Animal")
                .with_field("lives")
                .with_discriminator_value("cat"),
        )
        .build()
        .unwrap()
}

#[test]
fn derived_kind_inherits_storage_and_properties() {
    let model = animal_model();
    assert!(model.is_document_root("Cat").unwrap());
    assert_eq!(model.target_name("Cat").unwrap(), "animals");

    let names: Vec<_> = model
        .properties("Cat")
        .unwrap()
        .into_iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "name", "lives"]);
    assert_eq!(model.key_properties("Cat").unwrap().len(), 1);
    assert!(model.is_assignable_to("Cat", "Animal"));
    assert!(!model.is_assignable_to("Animal", "Cat"));
}

#[test]
fn discriminator_resolves_through_hierarchy_root() {
    let model = animal_model();
    let (property, value) = model.discriminator("Cat").unwrap().unwrap();
    assert_eq!(property, "$type");
    assert_eq!(value, &json!("cat"));
}

// ── Properties ───────────────────────────────────────────────────

#[test]
fn property_shorthands() {
    let key = Property::key("id");
    assert!(key.key);
    assert_eq!(key.json_name, "id");

    let renamed = Property::new("title").with_json_name("t");
    assert!(!renamed.key);
    assert_eq!(renamed.json_name, "t");

    let tags = Property::map("tags", Arc::new(JsonComparator));
    assert!(format!("{:?}", tags.comparer).contains("StructuralMapComparator"));
}

#[test]
fn unknown_kind_lookup() {
    let model = order_model();
    assert!(model.kind("Ghost").is_none());
    assert_eq!(
        model.require("Ghost").unwrap_err(),
        ModelError::UnknownKind("Ghost".into())
    );
}
