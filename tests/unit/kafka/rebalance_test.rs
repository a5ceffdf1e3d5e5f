use crate::unit::common::*;
use rdkafka::TopicPartitionList;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn recording_listener() -> (Listener, Arc<Mutex<Vec<RebalanceEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let listener = Listener::callback(move |event| sink.lock().unwrap().push(event));
    (listener, events)
}

#[test]
fn test_assigned_event_reaches_callback_in_order() {
    let (driver, state) = string_consumer();
    let (listener, events) = recording_listener();
    driver
        .subscribe_with_listener("t".into(), listener)
        .unwrap();

    state.assign(&[("t", 0), ("t", 1)]);

    assert_eq!(
        *events.lock().unwrap(),
        vec![RebalanceEvent {
            event: RebalanceKind::Assigned,
            partitions: vec![TopicPartitionKey::new("t", 0), TopicPartitionKey::new("t", 1)],
        }]
    );
}

#[test]
fn test_revoke_then_assign_sequence() {
    let (driver, state) = string_consumer();
    let (listener, events) = recording_listener();
    driver
        .subscribe_with_listener(vec!["a", "b"].into(), listener)
        .unwrap();

    state.assign(&[("a", 0), ("b", 0)]);
    state.revoke(&[("a", 0), ("b", 0)]);
    state.assign(&[("b", 0)]);

    let kinds: Vec<RebalanceKind> = events.lock().unwrap().iter().map(|e| e.event).collect();
    assert_eq!(
        kinds,
        vec![RebalanceKind::Assigned, RebalanceKind::Revoked, RebalanceKind::Assigned]
    );
    assert_eq!(driver.assignment().unwrap(), vec![TopicPartitionKey::new("b", 0)]);
}

#[test]
fn test_plain_subscribe_drops_previous_listener() {
    let (driver, state) = string_consumer();
    let (listener, events) = recording_listener();
    driver.subscribe_with_listener("t".into(), listener).unwrap();

    driver.subscribe("t".into()).unwrap();
    state.assign(&[("t", 0)]);

    assert!(events.lock().unwrap().is_empty());
}

#[derive(Default)]
struct CountingListener {
    assigned: AtomicUsize,
    revoked: AtomicUsize,
}

impl RebalanceListener for CountingListener {
    fn on_partitions_assigned(&self, partitions: &TopicPartitionList) {
        self.assigned.fetch_add(partitions.count(), Ordering::SeqCst);
    }

    fn on_partitions_revoked(&self, partitions: &TopicPartitionList) {
        self.revoked.fetch_add(partitions.count(), Ordering::SeqCst);
    }
}

#[test]
fn test_native_listener_receives_native_lists() {
    let (driver, state) = string_consumer();
    let native = Arc::new(CountingListener::default());
    driver
        .subscribe_with_listener("t".into(), Listener::Native(native.clone()))
        .unwrap();

    state.assign(&[("t", 0), ("t", 1), ("t", 2)]);
    state.revoke(&[("t", 1)]);

    assert_eq!(native.assigned.load(Ordering::SeqCst), 3);
    assert_eq!(native.revoked.load(Ordering::SeqCst), 1);
}
