use rowsync_model::{DefaultPolicy, Record, RowValues, TablePolicy, ValidState, READ_ONLY_FIELD};
use rowsync_types::RecordId;

// ── Default implementations ──────────────────────────────────────

#[test]
fn default_validate_accepts_any_values() {
    let mut values = RowValues::new("INVOICE");
    values.put("anything", "goes");
    assert!(DefaultPolicy.validate(&values).is_valid());
}

#[test]
fn default_read_only_follows_marker() {
    let plain = Record::new("INVOICE", RecordId::new(1));
    let marked = plain.clone().with(READ_ONLY_FIELD, "READ_ONLY");
    assert!(!DefaultPolicy.is_read_only(&plain));
    assert!(DefaultPolicy.is_read_only(&marked));
}

// ── Custom policy ────────────────────────────────────────────────

struct PositiveAmount;

impl TablePolicy for PositiveAmount {
    fn validate(&self, values: &RowValues) -> ValidState {
        match values.get("AMOUNT").and_then(|v| v.as_f64()) {
            Some(a) if a < 0.0 => ValidState::invalid("amount must be positive"),
            _ => ValidState::valid(),
        }
    }

    fn is_read_only(&self, record: &Record) -> bool {
        record.get_str("STATE") == Some("posted")
    }
}

#[test]
fn custom_validate() {
    let mut values = RowValues::new("INVOICE");
    values.put("AMOUNT", -3);
    assert_eq!(
        PositiveAmount.validate(&values),
        ValidState::invalid("amount must be positive")
    );
    values.put("AMOUNT", 3);
    assert!(PositiveAmount.validate(&values).is_valid());
}

#[test]
fn custom_read_only_rule() {
    let posted = Record::new("INVOICE", RecordId::new(1)).with("STATE", "posted");
    assert!(PositiveAmount.is_read_only(&posted));
}

#[test]
fn policy_is_object_safe() {
    let policies: Vec<Box<dyn TablePolicy>> = vec![Box::new(DefaultPolicy), Box::new(PositiveAmount)];
    assert_eq!(policies.len(), 2);
}
