//! Registry behavior with derived types: references, recursion,
//! collisions, and generation overrides.

#![allow(dead_code)]

use serde_json::json;
use tagschema::{Describe, Schema, SchemaError, SchemaRegistry};

#[derive(Describe)]
struct Node {
    value: i64,
    next: Option<Box<Node>>,
}

#[test]
fn recursive_types_terminate_with_a_ref() {
    let mut registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Node>().unwrap().unwrap();
    assert_eq!(schema.ref_path.as_deref(), Some("#/components/schemas/Node"));

    let value = serde_json::to_value(
        registry
            .schema_from_ref("#/components/schemas/Node")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        value["properties"]["next"],
        json!({"$ref": "#/components/schemas/Node"})
    );
    assert_eq!(registry.map().len(), 1);
}

#[derive(Describe)]
struct Team {
    name: String,
    members: Vec<Member>,
}

#[derive(Describe)]
struct Member {
    name: String,
}

#[test]
fn nested_records_register_once_each() {
    let mut registry = SchemaRegistry::new();
    registry.schema_for::<Team>().unwrap();

    let map = registry.map();
    assert_eq!(map.len(), 2);
    assert!(map.contains_key("Team"));
    assert!(map.contains_key("Member"));

    let team = serde_json::to_value(&map["Team"]).unwrap();
    assert_eq!(
        team["properties"]["members"],
        json!({
            "type": ["array", "null"],
            "items": {"$ref": "#/components/schemas/Member"}
        })
    );
}

mod billing {
    #[derive(tagschema::Describe)]
    pub struct Account {
        pub id: i64,
    }
}

mod auth {
    #[derive(tagschema::Describe)]
    pub struct Account {
        pub email: String,
    }
}

#[test]
fn colliding_names_across_modules_fail_loudly() {
    let mut registry = SchemaRegistry::new();
    registry.schema_for::<billing::Account>().unwrap();

    let err = registry.schema_for::<auth::Account>().unwrap_err();
    match err {
        SchemaError::DuplicateName { name, .. } => assert_eq!(name, "Account"),
        other => panic!("expected DuplicateName, got {other:?}"),
    }
    // The registered schema is untouched by the failed attempt.
    assert_eq!(registry.map().len(), 1);
}

#[derive(Describe)]
#[describe(rename = "AccountV2")]
struct RenamedAccount {
    id: i64,
}

#[test]
fn rename_controls_the_registered_name() {
    let mut registry = SchemaRegistry::new();
    let schema = registry.schema_for::<RenamedAccount>().unwrap().unwrap();
    assert_eq!(
        schema.ref_path.as_deref(),
        Some("#/components/schemas/AccountV2")
    );
}

#[derive(Describe)]
struct Page<T> {
    items: Vec<T>,
    total: i64,
}

#[derive(Describe)]
struct Order {
    id: i64,
}

#[test]
fn generic_instantiations_flatten_into_the_name() {
    let mut registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Page<Order>>().unwrap().unwrap();
    assert_eq!(
        schema.ref_path.as_deref(),
        Some("#/components/schemas/PageOrder")
    );

    let value = serde_json::to_value(
        registry
            .schema_from_ref("#/components/schemas/PageOrder")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(
        value["properties"]["items"]["items"],
        json!({"$ref": "#/components/schemas/Order"})
    );
}

#[derive(Describe)]
#[describe(text)]
struct Token {
    raw: String,
}

#[test]
fn text_types_are_inline_strings() {
    let mut registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Token>().unwrap().unwrap();
    assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"type": "string"}));
    assert!(registry.map().is_empty());
}

fn currency_schema(_reg: &mut SchemaRegistry) -> Schema {
    let mut schema = Schema::string();
    schema.pattern = Some("^[A-Z]{3}$".to_string());
    schema
}

#[derive(Describe)]
#[describe(schema_with = "currency_schema")]
struct Currency {
    code: String,
}

#[test]
fn provided_schemas_replace_generation() {
    let mut registry = SchemaRegistry::new();
    let schema = registry.schema_for::<Currency>().unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&schema).unwrap(),
        json!({"type": "string", "pattern": "^[A-Z]{3}$"})
    );
    assert!(registry.map().is_empty());
}

fn stamp_title(_reg: &mut SchemaRegistry, mut schema: Schema) -> Schema {
    schema.title = Some("Webhook payload".to_string());
    schema
}

#[derive(Describe)]
#[describe(transform_with = "stamp_title")]
struct Webhook {
    url: String,
}

#[test]
fn transforms_run_over_the_generated_schema() {
    let mut registry = SchemaRegistry::new();
    registry.schema_for::<Webhook>().unwrap();
    let schema = registry
        .schema_from_ref("#/components/schemas/Webhook")
        .unwrap();
    assert_eq!(schema.title.as_deref(), Some("Webhook payload"));
    // Generation still produced the structural part.
    assert!(schema.properties.contains_key("url"));
}

struct LegacyId;

#[derive(Describe)]
struct Ticket {
    id: i64,
}

#[test]
fn aliases_redirect_to_the_substitute_type() {
    let mut registry = SchemaRegistry::new();
    registry.register_type_alias::<LegacyId, Ticket>();

    let schema = registry
        .schema(
            tagschema::TypeInfo::of::<LegacyId>("LegacyId", tagschema::Shape::Unsupported),
            true,
            "",
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        schema.ref_path.as_deref(),
        Some("#/components/schemas/Ticket")
    );
}

#[derive(Describe)]
struct MultipartBody {
    payload: String,
}

#[test]
fn inline_only_schemas_are_kept_out_of_components() {
    let mut registry = SchemaRegistry::new();
    registry.schema_for::<MultipartBody>().unwrap();
    registry.mark_inline_only(MultipartBody::type_info(), "");

    assert!(registry.map().is_empty());
    assert!(registry
        .schema_from_ref("#/components/schemas/MultipartBody")
        .is_some());
}

#[test]
fn type_identity_survives_the_ref() {
    let mut registry = SchemaRegistry::new();
    registry.schema_for::<Ticket>().unwrap();
    assert_eq!(
        registry.type_from_ref("#/components/schemas/Ticket"),
        Some(std::any::TypeId::of::<Ticket>())
    );
}
