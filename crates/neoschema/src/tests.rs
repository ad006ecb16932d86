use std::collections::HashSet;
use std::time::Duration;

use crate::*;

fn int() -> TypeRef {
    TypeRef::named("int")
}

fn ids(members: &[MemberDescriptor]) -> Vec<u16> {
    members.iter().map(|m| m.id).collect()
}

fn names(members: &[MemberDescriptor]) -> Vec<&str> {
    members.iter().map(|m| m.name.as_str()).collect()
}

fn auto() -> SchemaConfig {
    SchemaConfig::new().with_generated_field_ids(true)
}

// ============================================================================
//  EXPLICIT IDS
// ============================================================================

#[test]
fn test_point_explicit_ids() {
    let point = TypeDescription::data("Point")
        .with_member(MemberDecl::field("x", int()).annotate(Annotation::id(0)))
        .with_member(MemberDecl::field("y", int()).annotate(Annotation::id(1)));

    let members = resolve(&point, &SchemaConfig::default()).expect("resolve failed");

    assert_eq!(ids(&members), vec![0, 1]);
    assert!(members.iter().all(|m| m.kind == MemberKind::Field));
    assert!(members.iter().all(|m| !m.is_primary_constructor_parameter));
}

#[test]
fn test_explicit_mode_drops_unannotated_members() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::field("a", int()).annotate(Annotation::id(4)))
        .with_member(MemberDecl::field("b", int()))
        .with_member(MemberDecl::property("C", int()));

    // Auto mode is requested but the annotation on `a` wins.
    let members = resolve(&ty, &auto()).unwrap();

    assert_eq!(names(&members), vec!["a"]);
    assert_eq!(members[0].id, 4);
}

#[test]
fn test_explicit_property_id() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::property("A", int()).annotate(Annotation::id(0)));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].kind, MemberKind::Property);
}

#[test]
fn test_generic_member_type_keeps_its_id() {
    let ty = TypeDescription::data("Test")
        .with_type_parameter("T1")
        .with_member(MemberDecl::field("A", TypeRef::param("T1")).annotate(Annotation::id(0)));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].declared_type, TypeRef::param("T1"));
}

#[test]
fn test_custom_id_annotation() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::field("a", int()).annotate(Annotation::with_value("Key", AnnotationValue::Int(7))));

    let without = resolve(&ty, &SchemaConfig::default()).unwrap();
    assert!(without.is_empty());

    let with = resolve(&ty, &SchemaConfig::new().with_id_annotation("Key")).unwrap();
    assert_eq!(ids(&with), vec![7]);
}

#[test]
fn test_static_abstract_and_non_serialized_excluded() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::field("a", int()).annotate(Annotation::id(0)))
        .with_member(MemberDecl::field("b", int()).annotate(Annotation::id(1)).into_static())
        .with_member(MemberDecl::property("c", int()).annotate(Annotation::id(2)).into_abstract())
        .with_member(MemberDecl::field("d", int()).annotate(Annotation::id(3)).annotate(Annotation::non_serialized()));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(names(&members), vec!["a"]);
}

// ============================================================================
//  AUTO IDS
// ============================================================================

#[test]
fn test_auto_mode_off_by_default() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::field("a", int()))
        .with_member(MemberDecl::field("b", int()));

    assert!(resolve(&ty, &SchemaConfig::default()).unwrap().is_empty());
}

#[test]
fn test_auto_mode_assigns_from_one_in_name_order() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::field("zeta", int()))
        .with_member(MemberDecl::property("Alpha", int()))
        .with_member(MemberDecl::field("beta", int()));

    let members = resolve(&ty, &auto()).unwrap();

    assert_eq!(names(&members), vec!["Alpha", "beta", "zeta"]);
    assert_eq!(ids(&members), vec![1, 2, 3]);
}

#[test]
fn test_resolve_is_independent_of_declaration_order() {
    let fields = ["c", "a", "d", "b"];
    let forward = fields
        .iter()
        .fold(TypeDescription::data("Test"), |ty, n| ty.with_member(MemberDecl::field(*n, int())));
    let backward = fields
        .iter()
        .rev()
        .fold(TypeDescription::data("Test"), |ty, n| ty.with_member(MemberDecl::field(*n, int())));

    let first = resolve(&forward, &auto()).unwrap();
    let second = resolve(&backward, &auto()).unwrap();
    let again = resolve(&forward, &auto()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, again);
}

#[test]
fn test_auto_property_stored_in_field_is_described_once() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::backed_property("Name", "<Name>k__BackingField", TypeRef::named("string")))
        .with_member(MemberDecl::backing_field("<Name>k__BackingField", "Name", TypeRef::named("string")));

    let members = resolve(&ty, &auto()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].kind, MemberKind::Field);
    assert_eq!(members[0].backs_property.as_deref(), Some("Name"));
    assert_eq!(members[0].id, 1);
}

// ============================================================================
//  PRECEDENCE AND BACKING FIELDS
// ============================================================================

#[test]
fn test_field_wins_over_property_with_same_id() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::property("Value", int()).annotate(Annotation::id(3)))
        .with_member(MemberDecl::field("value", int()).annotate(Annotation::id(3)));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, 3);
    assert_eq!(members[0].kind, MemberKind::Field);
    assert_eq!(members[0].name, "value");
}

#[test]
fn test_backing_field_inherits_property_id() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::backed_property("A", "_a", int()).annotate(Annotation::id(5)))
        .with_member(MemberDecl::backing_field("_a", "A", int()));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, 5);
    assert_eq!(members[0].name, "_a");
    assert_eq!(members[0].kind, MemberKind::Field);
}

#[test]
fn test_backing_field_of_non_serialized_property_is_skipped() {
    let ty = TypeDescription::data("Test")
        .with_member(MemberDecl::backed_property("A", "_a", int()).annotate(Annotation::non_serialized()))
        .with_member(MemberDecl::backing_field("_a", "A", int()));

    assert!(resolve(&ty, &auto()).unwrap().is_empty());
}

#[test]
fn test_duplicate_field_ids_rejected() {
    let ty = TypeDescription::data("Dup")
        .with_member(MemberDecl::field("a", int()).annotate(Annotation::id(1)))
        .with_member(MemberDecl::field("b", int()).annotate(Annotation::id(1)));

    let err = resolve(&ty, &SchemaConfig::default()).unwrap_err();

    assert_eq!(
        err,
        Error::DuplicateMemberId { type_name: "Dup".into(), id: 1, first: "a".into(), second: "b".into() }
    );
    assert!(err.to_string().contains("Dup"));
}

#[test]
fn test_invalid_id_annotation() {
    let negative = TypeDescription::data("Test").with_member(MemberDecl::field("a", int()).annotate(Annotation::id(-1)));
    let too_big = TypeDescription::data("Test").with_member(MemberDecl::field("a", int()).annotate(Annotation::id(70_000)));
    let missing = TypeDescription::data("Test").with_member(MemberDecl::field("a", int()).annotate(Annotation::marker("Id")));

    for ty in [negative, too_big, missing] {
        let err = resolve(&ty, &SchemaConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidIdAnnotation { .. }), "unexpected: {:?}", err);
    }
}

// ============================================================================
//  PRIMARY CONSTRUCTORS
// ============================================================================

fn record() -> TypeDescription {
    TypeDescription::data("Person")
        .with_primary_constructor(vec![
            ParameterDecl::new("Name", TypeRef::named("string")),
            ParameterDecl::new("Age", int()),
        ])
        .with_member(MemberDecl::property("Age", int()))
        .with_member(MemberDecl::property("Name", TypeRef::named("string")))
        .with_member(MemberDecl::property("Nickname", TypeRef::named("string")))
}

#[test]
fn test_primary_constructor_parameters_take_ordinals() {
    let members = resolve(&record(), &SchemaConfig::default()).unwrap();

    assert_eq!(names(&members), vec!["Name", "Age"]);
    assert_eq!(ids(&members), vec![0, 1]);
    assert!(members.iter().all(|m| m.is_primary_constructor_parameter));
}

#[test]
fn test_auto_ids_skip_constructor_ordinals() {
    let members = resolve(&record(), &auto()).unwrap();

    assert_eq!(names(&members), vec!["Name", "Age", "Nickname"]);
    assert_eq!(ids(&members), vec![0, 1, 2]);
    assert!(!members[2].is_primary_constructor_parameter);
}

#[test]
fn test_primary_constructor_matching_can_be_disabled() {
    let config = SchemaConfig::new().with_primary_constructor_parameters(false);
    assert!(resolve(&record(), &config).unwrap().is_empty());
}

#[test]
fn test_backing_field_matches_constructor_through_property() {
    let ty = TypeDescription::data("Person")
        .with_primary_constructor(vec![ParameterDecl::new("Name", TypeRef::named("string"))])
        .with_member(MemberDecl::backed_property("Name", "<Name>k__BackingField", TypeRef::named("string")))
        .with_member(MemberDecl::backing_field("<Name>k__BackingField", "Name", TypeRef::named("string")));

    let members = resolve(&ty, &SchemaConfig::default()).unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, 0);
    assert_eq!(members[0].kind, MemberKind::Field);
    assert!(members[0].is_primary_constructor_parameter);
}

// ============================================================================
//  DISPATCH CONTAINERS
// ============================================================================

#[test]
fn test_dispatch_container_with_property_rejected() {
    let ty = TypeDescription::dispatch_container("IGreeter")
        .with_member(MemberDecl::property("Name", TypeRef::named("string")));

    let err = resolve(&ty, &SchemaConfig::default()).unwrap_err();

    assert_eq!(err, Error::DuplicateMemberAnnotation { type_name: "IGreeter".into(), member: "Name".into() });
}

#[test]
fn test_dispatch_container_with_fields_is_fine() {
    let ty = TypeDescription::dispatch_container("Args")
        .with_member(MemberDecl::field("arg0", int()).annotate(Annotation::id(0)));

    assert_eq!(resolve(&ty, &SchemaConfig::default()).unwrap().len(), 1);
}

// ============================================================================
//  INVARIANTS
// ============================================================================

#[test]
fn test_ids_unique_across_mixed_types() {
    let types = vec![
        record(),
        TypeDescription::data("Mixed")
            .with_member(MemberDecl::field("a", int()))
            .with_member(MemberDecl::property("B", int()))
            .with_member(MemberDecl::backed_property("C", "_c", int()))
            .with_member(MemberDecl::backing_field("_c", "C", int()))
            .with_member(MemberDecl::field("d", int()).annotate(Annotation::non_serialized())),
        TypeDescription::data("Explicit")
            .with_member(MemberDecl::property("P", int()).annotate(Annotation::id(2)))
            .with_member(MemberDecl::field("f", int()).annotate(Annotation::id(2)))
            .with_member(MemberDecl::field("g", int()).annotate(Annotation::id(9))),
    ];

    for ty in &types {
        let members = resolve(ty, &auto()).unwrap();
        let unique: HashSet<u16> = members.iter().map(|m| m.id).collect();
        assert_eq!(unique.len(), members.len(), "duplicate ids in {}", ty.name);
    }
}

// ============================================================================
//  TYPE REFERENCES AND CONFIG
// ============================================================================

#[test]
fn test_type_ref_unbound_and_construct() {
    let task_int = TypeRef::generic("Task", [int()]);
    let shape = task_int.unbound().expect("generic type has a shape");

    assert_eq!(shape, TypeRef::unbound_shape("Task", 1));
    assert!(shape.is_unbound());
    assert!(shape.unbound().is_none());
    assert!(int().unbound().is_none());

    let request = TypeRef::generic("Request", [TypeRef::param("TResult")]);
    assert_eq!(request.construct(&[int()]), Some(TypeRef::generic("Request", [int()])));
    assert_eq!(request.construct(&[]), None);

    assert_eq!(TypeRef::generic("Map", [int(), TypeRef::Hole]).to_string(), "Map<int, _>");
    assert!(TypeRef::void().is_void());
}

#[test]
fn test_config_annotation_lookups() {
    let config = SchemaConfig::default();
    let annotations = vec![
        Annotation::alias("say-hi"),
        Annotation::with_value("ResponseTimeout", AnnotationValue::Int(1500)),
    ];

    assert_eq!(config.alias_of(&annotations), Some("say-hi"));
    assert_eq!(config.response_timeout_of(&annotations), Some(Ok(Duration::from_millis(1500))));
    assert_eq!(config.response_timeout_of(&[]), None);

    let bad = vec![Annotation::with_value("ResponseTimeout", AnnotationValue::Int(-5))];
    assert!(matches!(config.response_timeout_of(&bad), Some(Err(_))));
}

#[test]
fn test_config_cancellation_types() {
    let config = SchemaConfig::default();
    assert_eq!(config.cancellation_type, TypeRef::named("CancellationToken"));
    assert_eq!(config.token_id_type, TypeRef::named("TokenId"));

    let config = config.with_token_id_type(TypeRef::named("Guid"));
    assert_eq!(config.token_id_type, TypeRef::named("Guid"));
    assert_eq!(config.cancellation_type, TypeRef::named("CancellationToken"));
}

#[test]
fn test_descriptors_are_plain_serializable_values() {
    let point = TypeDescription::data("Point")
        .with_member(MemberDecl::field("x", int()).annotate(Annotation::id(0)));
    let members = resolve(&point, &SchemaConfig::default()).unwrap();

    let json = serde_json::to_string(&members).expect("serialize failed");
    let back: Vec<MemberDescriptor> = serde_json::from_str(&json).expect("deserialize failed");

    assert_eq!(back, members);
}
