use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::errors::{Error, Result};
use crate::store::{DurableStore, MemoryStore};
use crate::sync::{SessionId, SyncContext, SyncKind, SyncMessage, SyncedCell, SYNC_CHANNEL};
use crate::transport::{BroadcastSubscription, BroadcastTransport, NullTransport};

/// Transport double: records everything published and feeds injected
/// messages to subscribers.
#[derive(Default)]
struct TestTransport {
    published: Mutex<Vec<SyncMessage>>,
    incoming: Arc<Mutex<VecDeque<SyncMessage>>>,
}

impl TestTransport {
    fn inject(&self, message: SyncMessage) {
        self.incoming.lock().unwrap().push_back(message);
    }

    fn published(&self) -> Vec<SyncMessage> {
        self.published.lock().unwrap().clone()
    }
}

struct TestSubscription {
    incoming: Arc<Mutex<VecDeque<SyncMessage>>>,
}

impl BroadcastSubscription for TestSubscription {
    fn try_next(&mut self) -> Option<SyncMessage> {
        self.incoming.lock().unwrap().pop_front()
    }
}

impl BroadcastTransport for TestTransport {
    fn publish(&self, channel: &str, message: SyncMessage) {
        assert_eq!(channel, SYNC_CHANNEL);
        self.published.lock().unwrap().push(message);
    }

    fn subscribe(&self, _channel: &str) -> Box<dyn BroadcastSubscription> {
        Box::new(TestSubscription {
            incoming: Arc::clone(&self.incoming),
        })
    }
}

/// Store double whose every operation fails.
struct FailingStore;

impl DurableStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Value>> {
        Err(Error::storage("store is unavailable"))
    }

    fn set(&self, _key: &str, _value: &Value) -> Result<()> {
        Err(Error::storage("store is unavailable"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::storage("store is unavailable"))
    }
}

const KEY: &str = "cell-under-test";

fn context(store: Arc<dyn DurableStore>, transport: Arc<dyn BroadcastTransport>) -> SyncContext {
    SyncContext::new(store, transport)
}

fn remote_update(value: Value, timestamp: i64) -> SyncMessage {
    SyncMessage::update(KEY, value, timestamp, SessionId::generate())
}

#[test]
fn write_then_read_round_trip() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["ana".to_string()]);
    assert_eq!(cell.read(), vec!["ana".to_string()]);

    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, SyncKind::Update);
    assert_eq!(published[0].key, KEY);
    assert_eq!(published[0].value, Some(json!(["ana"])));
    assert_eq!(published[0].sender_id, ctx.session_id);
}

#[test]
fn write_round_trip_survives_store_and_transport_failure() {
    let ctx = context(Arc::new(FailingStore), Arc::new(NullTransport));
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["beto".to_string()]);
    assert_eq!(cell.read(), vec!["beto".to_string()]);
}

#[test]
fn updater_sees_current_local_value() {
    let ctx = context(Arc::new(MemoryStore::new()), Arc::new(TestTransport::default()));
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["ana".to_string()]);
    cell.write_with(|current| {
        let mut next = current.clone();
        next.push("beto".to_string());
        next
    });
    assert_eq!(cell.read(), vec!["ana".to_string(), "beto".to_string()]);
}

#[test]
fn remote_update_applies_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(TestTransport::default());
    let ctx = context(store.clone(), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    transport.inject(remote_update(json!(["carla"]), 10));
    assert_eq!(cell.apply_pending(), 1);
    assert_eq!(cell.read(), vec!["carla".to_string()]);
    assert_eq!(cell.last_applied_timestamp(), 10);
    assert_eq!(store.get(KEY).unwrap(), Some(json!(["carla"])));
}

#[test]
fn replaying_a_message_applies_only_once() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    let message = remote_update(json!(["carla"]), 10);
    transport.inject(message.clone());
    transport.inject(message);
    assert_eq!(cell.apply_pending(), 1);
    assert_eq!(cell.read(), vec!["carla".to_string()]);
}

#[test]
fn own_broadcast_is_never_reapplied() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["ana".to_string()]);
    // Even a newer message is discarded when it carries our own identity.
    let echo = SyncMessage::update(
        KEY,
        json!(["someone-else"]),
        cell.last_applied_timestamp() + 1_000,
        ctx.session_id.clone(),
    );
    transport.inject(echo);
    assert_eq!(cell.apply_pending(), 0);
    assert_eq!(cell.read(), vec!["ana".to_string()]);
}

#[test]
fn messages_for_other_keys_are_ignored() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    transport.inject(SyncMessage::update(
        "some-other-key",
        json!(["carla"]),
        10,
        SessionId::generate(),
    ));
    assert_eq!(cell.apply_pending(), 0);
    assert_eq!(cell.read(), Vec::<String>::new());
    assert_eq!(cell.last_applied_timestamp(), 0);
}

#[test]
fn later_timestamp_wins_regardless_of_delivery_order() {
    for order in [[10, 20], [20, 10]] {
        let transport = Arc::new(TestTransport::default());
        let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
        let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

        for timestamp in order {
            transport.inject(remote_update(json!([format!("value-{timestamp}")]), timestamp));
        }
        cell.apply_pending();
        assert_eq!(cell.read(), vec!["value-20".to_string()]);
        assert_eq!(cell.last_applied_timestamp(), 20);
    }
}

#[test]
fn remote_delete_resets_to_default_and_clears_store() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(TestTransport::default());
    let ctx = context(store.clone(), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, vec!["default".to_string()]);

    cell.write(vec!["ana".to_string()]);
    let timestamp = cell.last_applied_timestamp() + 1;
    transport.inject(SyncMessage::delete(KEY, timestamp, SessionId::generate()));
    assert_eq!(cell.apply_pending(), 1);
    assert_eq!(cell.read(), vec!["default".to_string()]);
    assert_eq!(store.get(KEY).unwrap(), None);
}

#[test]
fn malformed_messages_are_discarded_without_side_effects() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    // Update without a payload.
    transport.inject(SyncMessage {
        kind: SyncKind::Update,
        key: KEY.to_string(),
        value: None,
        timestamp: 10,
        sender_id: SessionId::generate(),
    });
    // Update whose payload does not decode to the cell's shape.
    transport.inject(remote_update(json!(42), 11));

    assert_eq!(cell.apply_pending(), 0);
    assert_eq!(cell.read(), Vec::<String>::new());
    // A discarded message must not advance the staleness clock.
    assert_eq!(cell.last_applied_timestamp(), 0);
}

#[test]
fn local_write_shadows_older_remote_updates() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["ana".to_string()]);
    transport.inject(remote_update(json!(["older"]), 1));
    assert_eq!(cell.apply_pending(), 0);
    assert_eq!(cell.read(), vec!["ana".to_string()]);
}

#[test]
fn consecutive_writes_carry_strictly_increasing_timestamps() {
    let transport = Arc::new(TestTransport::default());
    let ctx = context(Arc::new(MemoryStore::new()), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());

    cell.write(vec!["a".to_string()]);
    cell.write(vec!["b".to_string()]);
    cell.write(vec!["c".to_string()]);

    let stamps: Vec<i64> = transport.published().iter().map(|m| m.timestamp).collect();
    assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]), "{stamps:?}");
}

#[test]
fn cell_seeds_from_stored_value() {
    let store = Arc::new(MemoryStore::new());
    store.set(KEY, &json!(["persisted"])).unwrap();
    let ctx = context(store, Arc::new(NullTransport));
    let cell = SyncedCell::new(&ctx, KEY, Vec::<String>::new());
    assert_eq!(cell.read(), vec!["persisted".to_string()]);
}

#[test]
fn cell_falls_back_to_default_on_bad_or_unavailable_storage() {
    // Stored document with the wrong shape.
    let store = Arc::new(MemoryStore::new());
    store.set(KEY, &json!({"not": "a list"})).unwrap();
    let ctx = context(store, Arc::new(NullTransport));
    let cell = SyncedCell::new(&ctx, KEY, vec!["default".to_string()]);
    assert_eq!(cell.read(), vec!["default".to_string()]);

    // Store unavailable altogether.
    let ctx = context(Arc::new(FailingStore), Arc::new(NullTransport));
    let cell = SyncedCell::new(&ctx, KEY, vec!["default".to_string()]);
    assert_eq!(cell.read(), vec!["default".to_string()]);
}

#[test]
fn clear_publishes_delete_and_resets() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(TestTransport::default());
    let ctx = context(store.clone(), transport.clone());
    let mut cell = SyncedCell::new(&ctx, KEY, vec!["default".to_string()]);

    cell.write(vec!["ana".to_string()]);
    cell.clear();

    assert_eq!(cell.read(), vec!["default".to_string()]);
    assert_eq!(store.get(KEY).unwrap(), None);
    let published = transport.published();
    assert_eq!(published.last().unwrap().kind, SyncKind::Delete);
    assert_eq!(published.last().unwrap().value, None);
}

#[test]
fn message_serialization_matches_wire_contract() {
    let message = SyncMessage::update(KEY, json!([1]), 42, SessionId::generate());
    let encoded = serde_json::to_value(&message).unwrap();
    assert_eq!(encoded["kind"], "UPDATE");
    assert_eq!(encoded["key"], KEY);
    assert_eq!(encoded["timestamp"], 42);
    assert!(encoded["senderId"].is_string());

    let message = SyncMessage::delete(KEY, 43, SessionId::generate());
    let encoded = serde_json::to_value(&message).unwrap();
    assert_eq!(encoded["kind"], "DELETE");
    assert_eq!(encoded.get("value"), None);
}
