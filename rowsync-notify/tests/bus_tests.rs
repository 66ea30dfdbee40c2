use rowsync_notify::{BusConfig, BusError, ChangeBus, ChangeKind, TableEvent, TableHandler};
use rowsync_types::{RecordId, SubscriberId};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(String, RecordId, ChangeKind)>>>;

fn recorder() -> (Seen, TableHandler) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: TableHandler = Arc::new(move |ev: &TableEvent| {
        sink.lock()
            .unwrap()
            .push((ev.table.clone(), ev.record_id, ev.kind));
    });
    (seen, handler)
}

// ── Subscription bookkeeping ─────────────────────────────────────

#[test]
fn subscribe_twice_with_same_id_is_noop() {
    let bus = ChangeBus::immediate();
    let id = SubscriberId::new();
    let (_, h) = recorder();
    assert!(bus.subscribe("INVOICE", id, Arc::clone(&h)));
    assert!(!bus.subscribe("INVOICE", id, h));
    assert_eq!(bus.subscriber_count("INVOICE"), 1);
    assert!(bus.is_subscribed("INVOICE", id));
}

#[test]
fn same_id_on_two_tables_counts_separately() {
    let bus = ChangeBus::immediate();
    let id = SubscriberId::new();
    let (_, h) = recorder();
    bus.subscribe("INVOICE", id, Arc::clone(&h));
    bus.subscribe("CLIENT", id, h);
    assert_eq!(bus.subscriber_count("INVOICE"), 1);
    assert_eq!(bus.subscriber_count("CLIENT"), 1);
}

#[test]
fn unsubscribe_removes_only_that_subscriber() {
    let bus = ChangeBus::immediate();
    let a = SubscriberId::new();
    let b = SubscriberId::new();
    let (_, h) = recorder();
    bus.subscribe("INVOICE", a, Arc::clone(&h));
    bus.subscribe("INVOICE", b, h);

    assert!(bus.unsubscribe("INVOICE", a));
    assert!(!bus.unsubscribe("INVOICE", a));
    assert!(!bus.is_subscribed("INVOICE", a));
    assert!(bus.is_subscribed("INVOICE", b));
    assert_eq!(bus.subscriber_count("INVOICE"), 1);
}

#[test]
fn unsubscribe_unknown_table() {
    let bus = ChangeBus::immediate();
    assert!(!bus.unsubscribe("NOPE", SubscriberId::new()));
    assert_eq!(bus.subscriber_count("NOPE"), 0);
}

// ── Immediate delivery ───────────────────────────────────────────

#[test]
fn immediate_delivers_only_matching_table() {
    let bus = ChangeBus::immediate();
    let (seen, h) = recorder();
    bus.subscribe("INVOICE", SubscriberId::new(), h);

    bus.publish(TableEvent::updated("INVOICE", RecordId::new(1))).unwrap();
    bus.publish(TableEvent::updated("CLIENT", RecordId::new(1))).unwrap();
    bus.publish(TableEvent::deleted("INVOICE", RecordId::new(2))).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("INVOICE".to_string(), RecordId::new(1), ChangeKind::Updated),
            ("INVOICE".to_string(), RecordId::new(2), ChangeKind::Deleted),
        ]
    );
}

#[test]
fn publish_without_subscribers_is_ok() {
    let bus = ChangeBus::immediate();
    assert!(bus.publish(TableEvent::added("INVOICE", RecordId::new(1))).is_ok());
}

#[test]
fn handler_may_unsubscribe_itself_during_delivery() {
    let bus = ChangeBus::immediate();
    let id = SubscriberId::new();
    let calls = Arc::new(Mutex::new(0));
    let bus2 = bus.clone();
    let calls2 = Arc::clone(&calls);
    bus.subscribe(
        "INVOICE",
        id,
        Arc::new(move |_ev: &TableEvent| {
            *calls2.lock().unwrap() += 1;
            bus2.unsubscribe("INVOICE", id);
        }),
    );

    bus.publish(TableEvent::updated("INVOICE", RecordId::new(1))).unwrap();
    bus.publish(TableEvent::updated("INVOICE", RecordId::new(1))).unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn immediate_flush_completes() {
    let bus = ChangeBus::immediate();
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    assert_eq!(rt.block_on(bus.flush()), Ok(()));
}

// ── Background delivery ──────────────────────────────────────────

#[test]
fn spawn_outside_runtime_fails() {
    let err = ChangeBus::spawn(BusConfig::default()).unwrap_err();
    assert_eq!(err, BusError::NoRuntime);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_preserves_publish_order() {
    let bus = ChangeBus::spawn(BusConfig::default()).unwrap();
    let (seen, h) = recorder();
    bus.subscribe("LINE", SubscriberId::new(), h);

    for i in 0..50 {
        bus.publish(TableEvent::updated("LINE", RecordId::new(i))).unwrap();
    }
    bus.flush().await.unwrap();

    let ids: Vec<i64> = seen.lock().unwrap().iter().map(|(_, id, _)| id.get()).collect();
    assert_eq!(ids, (0..50).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_delivers_off_the_publishing_thread() {
    let bus = ChangeBus::spawn(BusConfig {
        name: "test-bus".into(),
    })
    .unwrap();
    assert_eq!(bus.name(), "test-bus");

    let publisher = std::thread::current().id();
    let delivered_on = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&delivered_on);
    bus.subscribe(
        "LINE",
        SubscriberId::new(),
        Arc::new(move |_ev: &TableEvent| {
            *slot.lock().unwrap() = Some(std::thread::current().id());
        }),
    );

    bus.publish(TableEvent::deleted("LINE", RecordId::new(1))).unwrap();
    bus.flush().await.unwrap();

    let on = delivered_on.lock().unwrap().expect("delivered");
    assert_ne!(on, publisher);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_unsubscribed_before_dispatch_is_skipped() {
    let bus = ChangeBus::spawn(BusConfig::default()).unwrap();
    let id = SubscriberId::new();
    let (seen, h) = recorder();
    bus.subscribe("LINE", id, h);
    bus.unsubscribe("LINE", id);

    bus.publish(TableEvent::updated("LINE", RecordId::new(1))).unwrap();
    bus.flush().await.unwrap();
    assert!(seen.lock().unwrap().is_empty());
}
