use addonsync_types::{ContentId, EntityTypeId, Error, PropertyKind, PropertyValue, RuntimeId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── ContentId ─────────────────────────────────────────────────────

#[test]
fn content_id_parse_is_case_insensitive() {
    let lower = ContentId::parse("5c0e3a2f-8e44-4b6a-9b8f-2f4c8d1e0a11").unwrap();
    let upper = ContentId::parse("5C0E3A2F-8E44-4B6A-9B8F-2F4C8D1E0A11").unwrap();
    assert_eq!(lower, upper);
}

#[test]
fn content_id_displays_lowercase_hyphenated() {
    let id = ContentId::parse("5C0E3A2F-8E44-4B6A-9B8F-2F4C8D1E0A11").unwrap();
    assert_eq!(id.to_string(), "5c0e3a2f-8e44-4b6a-9b8f-2f4c8d1e0a11");
}

#[test]
fn content_id_rejects_non_hyphenated_forms() {
    for text in [
        "5c0e3a2f8e444b6a9b8f2f4c8d1e0a11",
        "{5c0e3a2f-8e44-4b6a-9b8f-2f4c8d1e0a11}",
        "urn:uuid:5c0e3a2f-8e44-4b6a-9b8f-2f4c8d1e0a11",
        "5c0e3a2f-8e44-4b6a-9b8f2f4c-8d1e0a11",
        "5c0e3a2g-8e44-4b6a-9b8f-2f4c8d1e0a11",
    ] {
        assert!(
            matches!(ContentId::parse(text), Err(Error::InvalidContentId(_))),
            "{text} should be rejected"
        );
    }
    let id = ContentId::parse("5c0e3a2f-8e44-4b6a-9b8f-2f4c8d1e0a11").unwrap();
    assert!(!id.matches("5c0e3a2f8e444b6a9b8f2f4c8d1e0a11"));
}

#[test]
fn content_id_parse_invalid() {
    assert!(ContentId::parse("not-a-uuid").is_err());
    assert!(ContentId::from_str("").is_err());
}

#[test]
fn content_id_matches_any_textual_form() {
    let id = ContentId::random();
    assert!(id.matches(&id.to_string().to_uppercase()));
    assert!(!id.matches("garbage"));
    assert!(!id.matches(&ContentId::random().to_string()));
}

#[test]
fn content_id_hash_and_eq() {
    let id = ContentId::random();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(ContentId::parse(&id.to_string().to_uppercase()).unwrap());
    assert_eq!(set.len(), 1);
}

// ── EntityTypeId ─────────────────────────────────────────────────

#[test]
fn entity_type_rejects_blank() {
    assert!(EntityTypeId::new("").is_err());
    assert!(EntityTypeId::new("   ").is_err());
}

#[test]
fn entity_type_player() {
    assert!(EntityTypeId::player().is_player());
    assert!(!EntityTypeId::new("custom:golem").unwrap().is_player());
    assert_eq!(EntityTypeId::player().as_str(), "minecraft:player");
}

#[test]
fn runtime_id_display() {
    assert_eq!(RuntimeId(42).to_string(), "42");
}

// ── PropertyValue ────────────────────────────────────────────────

#[test]
fn declared_kind_parsing() {
    assert_eq!(PropertyKind::from_declared("INT"), Some(PropertyKind::Int));
    assert_eq!(PropertyKind::from_declared("float"), Some(PropertyKind::Float));
    assert_eq!(PropertyKind::from_declared("bool"), None);
}

#[test]
fn non_integral_float_does_not_become_int() {
    assert_eq!(PropertyValue::Float(2.5).coerce(PropertyKind::Int), None);
    assert_eq!(
        PropertyValue::Float(3.0).coerce(PropertyKind::Int),
        Some(PropertyValue::Int(3))
    );
    assert_eq!(PropertyValue::Float(f32::NAN).coerce(PropertyKind::Float), None);
}

#[test]
fn value_serde_is_untagged() {
    let v: PropertyValue = serde_json::from_str("7").unwrap();
    assert_eq!(v, PropertyValue::Int(7));
    let v: PropertyValue = serde_json::from_str("0.5").unwrap();
    assert_eq!(v, PropertyValue::Float(0.5));
}

proptest! {
    #[test]
    fn int_to_float_and_back_preserves_small_ints(v in -1_000_000i32..1_000_000) {
        let f = PropertyValue::Int(v).coerce(PropertyKind::Float).unwrap();
        prop_assert_eq!(f.coerce(PropertyKind::Int), Some(PropertyValue::Int(v)));
    }
}
