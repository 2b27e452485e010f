//! Tests for sort module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

// ============================================================================
// Direction Tests
// ============================================================================

#[test_case("asc", SortDirection::Ascending ; "short ascending")]
#[test_case("ASC", SortDirection::Ascending ; "upper ascending")]
#[test_case("ascending", SortDirection::Ascending ; "long ascending")]
#[test_case("desc", SortDirection::Descending ; "short descending")]
#[test_case("Descending", SortDirection::Descending ; "mixed descending")]
fn test_direction_parse(input: &str, expected: SortDirection) {
    assert_eq!(input.parse::<SortDirection>().unwrap(), expected);
}

#[test]
fn test_direction_parse_invalid() {
    let err = "sideways".parse::<SortDirection>().unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("sideways"));
}

#[test]
fn test_direction_default_is_ascending() {
    assert!(SortDirection::default().is_ascending());
}

// ============================================================================
// Specification Construction Tests
// ============================================================================

#[test]
fn test_specification_single_key() {
    let sort = SortSpecification::ascending("id").unwrap();
    assert_eq!(sort.len(), 1);
    assert!(!sort.is_empty());
    assert_eq!(sort.orders()[0], SortOrder::asc("id"));
    assert_eq!(sort.to_string(), "id ASC");
}

#[test]
fn test_specification_preserves_key_order() {
    let sort = SortSpecification::from_pairs([
        ("last_name", SortDirection::Ascending),
        ("created_at", SortDirection::Descending),
        ("id", SortDirection::Ascending),
    ])
    .unwrap();

    let fields: Vec<_> = sort.iter().map(|o| o.field.as_str()).collect();
    assert_eq!(fields, vec!["last_name", "created_at", "id"]);
    assert_eq!(sort.canonical(), "last_name:asc|created_at:desc|id:asc");
}

#[test]
fn test_specification_empty_rejected() {
    let err = SortSpecification::new(vec![]).unwrap_err();
    assert!(err.is_configuration());
}

#[test_case("" ; "empty")]
#[test_case("1id" ; "leading digit")]
#[test_case("id; DROP TABLE users" ; "injection")]
#[test_case("name desc" ; "embedded space")]
#[test_case("owner..name" ; "double dot")]
fn test_specification_invalid_field_rejected(field: &str) {
    let err = SortSpecification::ascending(field).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_specification_nested_field_allowed() {
    assert!(is_valid_field_name("owner.name"));
    assert!(SortSpecification::ascending("owner.name").is_ok());
}

#[test]
fn test_specification_duplicate_field_rejected() {
    let err = SortSpecification::new(vec![SortOrder::asc("id"), SortOrder::desc("id")])
        .unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

// ============================================================================
// Signature Tests
// ============================================================================

#[test]
fn test_signature_is_stable() {
    let a = SortSpecification::ascending("id").unwrap();
    let b = SortSpecification::ascending("id").unwrap();
    assert_eq!(a.signature(), b.signature());
    assert_eq!(a.signature().as_str().len(), 16);
}

#[test]
fn test_signature_depends_on_direction() {
    let asc = SortSpecification::ascending("id").unwrap();
    let desc = SortSpecification::descending("id").unwrap();
    assert_ne!(asc.signature(), desc.signature());
}

#[test]
fn test_signature_depends_on_key_order() {
    let a = SortSpecification::new(vec![SortOrder::asc("a"), SortOrder::asc("b")]).unwrap();
    let b = SortSpecification::new(vec![SortOrder::asc("b"), SortOrder::asc("a")]).unwrap();
    assert_ne!(a.signature(), b.signature());
}

#[test]
fn test_signature_from_persisted() {
    let sort = SortSpecification::ascending("id").unwrap();
    let persisted = SortSignature::from_persisted(sort.signature().to_string());
    assert_eq!(persisted, sort.signature());
}

// ============================================================================
// Deserialization Tests
// ============================================================================

#[test]
fn test_deserialize_list_form() {
    let sort: SortSpecification = serde_json::from_value(json!([
        {"field": "id", "direction": "asc"},
        {"field": "name", "direction": "DESC"}
    ]))
    .unwrap();

    assert_eq!(
        sort.orders(),
        &[SortOrder::asc("id"), SortOrder::desc("name")]
    );
}

#[test]
fn test_deserialize_list_default_direction() {
    let sort: SortSpecification = serde_json::from_value(json!([{"field": "id"}])).unwrap();
    assert_eq!(sort.orders(), &[SortOrder::asc("id")]);
}

#[test]
fn test_deserialize_map_form_keeps_document_order() {
    let yaml = "zeta: asc\nalpha: desc\n";
    let sort: SortSpecification = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        sort.orders(),
        &[SortOrder::asc("zeta"), SortOrder::desc("alpha")]
    );
}

#[test]
fn test_deserialize_empty_rejected() {
    let result: std::result::Result<SortSpecification, _> = serde_json::from_value(json!([]));
    assert!(result.is_err());
}

#[test]
fn test_serialize_as_list() {
    let sort = SortSpecification::descending("created_at").unwrap();
    let value = serde_json::to_value(&sort).unwrap();
    assert_eq!(value, json!([{"field": "created_at", "direction": "desc"}]));
}
