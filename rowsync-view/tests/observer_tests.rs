mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use rowsync_model::{FieldDef, Record, Table, ValidState};
use rowsync_types::RecordId;
use serde_json::json;
use rowsync_view::{Listener, Property, RecordView, Required, ValueView, ViewEvent};
use std::sync::{Arc, Mutex, Weak};

fn recorder() -> (Arc<Mutex<Vec<ViewEvent>>>, Listener) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let listener: Listener = Arc::new(move |event: &ViewEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    (events, listener)
}

fn take(events: &Mutex<Vec<ViewEvent>>) -> Vec<ViewEvent> {
    std::mem::take(&mut *events.lock().unwrap())
}

#[test]
fn select_announces_filling_around_identity() {
    let f = Fixture::invoice();
    let (events, listener) = recorder();
    f.view.add_listener(listener);

    f.view
        .select(Some(&Record::new("INVOICE", RecordId::new(5))))
        .unwrap();
    assert_eq!(
        take(&events),
        vec![
            ViewEvent::Filling(true),
            ViewEvent::SelectedId(RecordId::new(5)),
            ViewEvent::Filling(false),
        ]
    );
}

#[test]
fn unchanged_identity_is_not_announced() {
    let f = Fixture::invoice();
    let (events, listener) = recorder();
    f.view.add_property_listener(Property::SelectedId, listener);

    let record = Record::new("INVOICE", RecordId::new(5));
    f.view.select(Some(&record)).unwrap();
    f.view.select(Some(&record)).unwrap();
    f.view.select(None).unwrap();
    f.view.select(None).unwrap();
    assert_eq!(
        take(&events),
        vec![
            ViewEvent::SelectedId(RecordId::new(5)),
            ViewEvent::SelectedId(RecordId::NONE),
        ]
    );
}

#[test]
fn property_listener_only_hears_its_property() {
    let f = Fixture::invoice();
    let (events, listener) = recorder();
    f.view.add_property_listener(Property::Filling, listener);
    f.view
        .select(Some(&Record::new("INVOICE", RecordId::new(5))))
        .unwrap();
    let events = take(&events);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.property() == Property::Filling));
}

#[test]
fn removed_listener_hears_nothing() {
    let f = Fixture::invoice();
    let (events, listener) = recorder();
    let id = f.view.add_listener(listener);
    assert!(f.view.remove_listener(id));
    assert!(!f.view.remove_listener(id));
    f.view
        .select(Some(&Record::new("INVOICE", RecordId::new(5))))
        .unwrap();
    assert!(take(&events).is_empty());
}

#[test]
fn read_only_selection_is_announced_on_change() {
    let f = Fixture::new(Arc::new(
        Table::new("LEDGER")
            .with_field(FieldDef::text("LABEL"))
            .with_read_only_marker(),
    ));
    let (events, listener) = recorder();
    f.view
        .add_property_listener(Property::ReadOnlySelection, listener);

    let locked = |id| Record::new("LEDGER", RecordId::new(id)).with("READ_ONLY", true);
    f.view.select(Some(&locked(1))).unwrap();
    f.view.select(Some(&locked(2))).unwrap();
    f.view.select(None).unwrap();
    assert_eq!(
        take(&events),
        vec![
            ViewEvent::ReadOnlySelection(true),
            ViewEvent::ReadOnlySelection(false),
        ]
    );
}

#[test]
fn validity_is_announced_on_change() {
    let f = Fixture::invoice();
    let (events, listener) = recorder();
    f.view.add_property_listener(Property::Validity, listener);

    f.view.set_local_validity(ValidState::invalid("locked")).unwrap();
    f.view.set_local_validity(ValidState::invalid("locked")).unwrap();
    f.view.set_local_validity(ValidState::valid()).unwrap();
    assert_eq!(
        take(&events),
        vec![
            ViewEvent::Validity(ValidState::invalid("locked")),
            ViewEvent::Validity(ValidState::valid()),
        ]
    );
}

#[test]
fn editing_a_field_announces_validity() {
    let f = Fixture::invoice();
    let amount = Arc::new(Required::new(ValueView::number("AMOUNT")));
    f.view.register(amount.clone()).unwrap();
    let id = f.seed(&[("AMOUNT", json!(10))]);
    f.view.select_id(id).unwrap();
    assert!(f.view.validity().is_valid());

    let (events, listener) = recorder();
    f.view.add_property_listener(Property::Validity, listener);
    amount.clear().unwrap();
    assert_eq!(f.view.validity(), ValidState::invalid("AMOUNT is required"));
    amount.clear().unwrap();
    amount.set_value(3).unwrap();
    assert_eq!(
        take(&events),
        vec![
            ViewEvent::Validity(ValidState::invalid("AMOUNT is required")),
            ViewEvent::Validity(ValidState::valid()),
        ]
    );
}

#[test]
fn listener_may_read_the_view() {
    let f = Fixture::invoice();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let weak: Weak<RecordView> = Arc::downgrade(&f.view);
    let sink = Arc::clone(&seen);
    f.view.add_property_listener(
        Property::Filling,
        Arc::new(move |_: &ViewEvent| {
            if let Some(view) = weak.upgrade() {
                sink.lock().unwrap().push((view.is_filling(), view.selected_id()));
            }
        }),
    );
    f.view
        .select(Some(&Record::new("INVOICE", RecordId::new(8))))
        .unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(true, RecordId::NONE), (false, RecordId::new(8))]
    );
}
