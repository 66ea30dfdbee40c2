use pretty_assertions::assert_eq;
use rowsync_model::{OrderHint, RowRef, RowValues, ValidState};
use rowsync_types::RecordId;
use serde_json::json;

// ── RowValues ────────────────────────────────────────────────────

#[test]
fn new_buffer_is_empty() {
    let v = RowValues::new("INVOICE");
    assert!(v.is_empty());
    assert_eq!(v.table(), "INVOICE");
}

#[test]
fn put_returns_previous_value() {
    let mut v = RowValues::new("INVOICE");
    assert_eq!(v.put("AMOUNT", 1), None);
    assert_eq!(v.put("AMOUNT", 2), Some(json!(1)));
    assert_eq!(v.get("AMOUNT"), Some(&json!(2)));
    assert_eq!(v.len(), 1);
}

#[test]
fn remove_and_contains() {
    let mut v = RowValues::new("INVOICE");
    v.put("NAME", "x");
    assert!(v.contains("NAME"));
    assert_eq!(v.remove("NAME"), Some(json!("x")));
    assert!(!v.contains("NAME"));
}

#[test]
fn into_map_keeps_values() {
    let mut v = RowValues::new("INVOICE");
    v.put("A", 1);
    v.put("B", json!(null));
    let map = v.into_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map["B"], json!(null));
}

// ── RowRef / OrderHint ───────────────────────────────────────────

#[test]
fn row_ref_display() {
    assert_eq!(RowRef::new("LINE", RecordId::new(4)).to_string(), "LINE#4");
}

#[test]
fn order_hint_serde() {
    let json = serde_json::to_string(&OrderHint::After(RecordId::new(3))).unwrap();
    assert_eq!(json, r#"{"after":3}"#);
}

// ── ValidState ───────────────────────────────────────────────────

#[test]
fn valid_has_no_reason() {
    let v = ValidState::valid();
    assert!(v.is_valid());
    assert_eq!(v.reason(), None);
    assert_eq!(v, ValidState::default());
}

#[test]
fn and_of_valid_and_invalid_is_invalid() {
    let v = ValidState::valid().and(ValidState::invalid("amount is required"));
    assert!(!v.is_valid());
    assert_eq!(v.reason(), Some("amount is required"));
}

#[test]
fn and_joins_reasons_in_order() {
    let v = ValidState::invalid("a").and(ValidState::invalid("b"));
    assert_eq!(v.reason(), Some("a\nb"));
}

#[test]
fn collect_folds_with_and() {
    let all: ValidState = vec![ValidState::valid(), ValidState::invalid("x"), ValidState::valid()]
        .into_iter()
        .collect();
    assert_eq!(all, ValidState::invalid("x"));
    let none: ValidState = Vec::<ValidState>::new().into_iter().collect();
    assert!(none.is_valid());
}

#[test]
fn equality_is_observational() {
    assert_eq!(ValidState::invalid("x"), ValidState::invalid("x"));
    assert_ne!(ValidState::invalid("x"), ValidState::invalid("y"));
}

#[test]
fn display() {
    assert_eq!(ValidState::valid().to_string(), "valid");
    assert_eq!(ValidState::invalid("empty").to_string(), "invalid: empty");
}
