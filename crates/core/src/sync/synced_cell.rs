//! The synchronized key-value cell.
//!
//! A cell composes one durable-store slot with one broadcast
//! subscription and exposes a single observable value. Local writes are
//! visible immediately; persistence and broadcast are best-effort and
//! never block or fail the write. Remote updates are applied through an
//! explicit [`SyncedCell::apply_pending`] pump, guarded by echo
//! suppression and a last-writer-wins timestamp comparison.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::events::{ChangeEvent, ChangeKind, ChangeOrigin, SyncEventSink};
use crate::store::DurableStore;
use crate::sync::{SessionId, SyncContext, SyncKind, SyncMessage, SYNC_CHANNEL};
use crate::transport::{BroadcastSubscription, BroadcastTransport};

pub struct SyncedCell<T> {
    key: String,
    default: T,
    current: T,
    /// Monotonically non-decreasing over the cell's lifetime. Advanced by
    /// local writes as well as applied remote messages, so a remote update
    /// older than the context's own latest write is discarded.
    last_applied: i64,
    session_id: SessionId,
    store: Arc<dyn DurableStore>,
    transport: Arc<dyn BroadcastTransport>,
    subscription: Box<dyn BroadcastSubscription>,
    events: Arc<dyn SyncEventSink>,
}

impl<T> SyncedCell<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Construct a cell for `key`, seeding the value from the durable
    /// store and falling back to `default` when the slot is absent,
    /// undecodable, or the store fails. Subscribes to the shared channel
    /// before returning; the subscription is released when the cell is
    /// dropped.
    pub fn new(ctx: &SyncContext, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let current = match ctx.store.get(&key) {
            Ok(Some(stored)) => match serde_json::from_value(stored) {
                Ok(value) => value,
                Err(err) => {
                    warn!("stored document under '{key}' does not match its shape, using default: {err}");
                    default.clone()
                }
            },
            Ok(None) => default.clone(),
            Err(err) => {
                warn!("failed to read '{key}' from the durable store, using default: {err}");
                default.clone()
            }
        };
        let subscription = ctx.transport.subscribe(SYNC_CHANNEL);
        Self {
            key,
            default,
            current,
            last_applied: 0,
            session_id: ctx.session_id.clone(),
            store: Arc::clone(&ctx.store),
            transport: Arc::clone(&ctx.transport),
            subscription,
            events: Arc::clone(&ctx.events),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Latest locally-applied value. Never blocks, never fails.
    pub fn read(&self) -> T {
        self.current.clone()
    }

    pub fn last_applied_timestamp(&self) -> i64 {
        self.last_applied
    }

    /// Replace the value.
    pub fn write(&mut self, value: T) {
        self.commit_local(value);
    }

    /// Replace the value computed from the current local value (not the
    /// durable store's possibly-stale copy).
    pub fn write_with(&mut self, update: impl FnOnce(&T) -> T) {
        let next = update(&self.current);
        self.commit_local(next);
    }

    /// Remove the slot from the durable store, reset to the default, and
    /// broadcast the deletion.
    pub fn clear(&mut self) {
        let timestamp = self.next_timestamp();
        self.last_applied = timestamp;
        if let Err(err) = self.store.remove(&self.key) {
            warn!("failed to remove '{}' from the durable store: {err}", self.key);
        }
        self.current = self.default.clone();
        self.transport.publish(
            SYNC_CHANNEL,
            SyncMessage::delete(self.key.clone(), timestamp, self.session_id.clone()),
        );
        self.notify(ChangeOrigin::Local, ChangeKind::Cleared, timestamp);
    }

    /// Drain the subscription queue, applying every message that survives
    /// the echo/key/staleness guards. Returns the number applied.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.subscription.try_next() {
            if self.apply_remote(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Write-through with immediate local visibility: persist, update the
    /// in-memory value, publish. Each step is best-effort; failure of one
    /// does not block the next, and `read()` reflects the new value even
    /// when every side effect failed.
    fn commit_local(&mut self, value: T) {
        let timestamp = self.next_timestamp();
        self.last_applied = timestamp;
        let encoded = match serde_json::to_value(&value) {
            Ok(encoded) => Some(encoded),
            Err(err) => {
                warn!("failed to encode '{}', keeping the value local: {err}", self.key);
                None
            }
        };
        if let Some(encoded) = &encoded {
            if let Err(err) = self.store.set(&self.key, encoded) {
                warn!("failed to persist '{}': {err}", self.key);
            }
        }
        self.current = value;
        if let Some(encoded) = encoded {
            self.transport.publish(
                SYNC_CHANNEL,
                SyncMessage::update(self.key.clone(), encoded, timestamp, self.session_id.clone()),
            );
        }
        self.notify(ChangeOrigin::Local, ChangeKind::Updated, timestamp);
    }

    fn apply_remote(&mut self, message: SyncMessage) -> bool {
        if message.sender_id == self.session_id {
            return false;
        }
        if message.key != self.key {
            return false;
        }
        if message.timestamp <= self.last_applied {
            debug!(
                "discarding stale message for '{}' ({} <= {})",
                self.key, message.timestamp, self.last_applied
            );
            return false;
        }
        if !message.is_well_formed() {
            warn!("discarding malformed sync message for '{}'", self.key);
            return false;
        }
        match message.kind {
            SyncKind::Update => {
                let Some(encoded) = message.value else {
                    return false;
                };
                let value: T = match serde_json::from_value(encoded.clone()) {
                    Ok(value) => value,
                    Err(err) => {
                        warn!("discarding undecodable update for '{}': {err}", self.key);
                        return false;
                    }
                };
                self.last_applied = message.timestamp;
                self.persist_remote(&encoded);
                self.current = value;
                self.notify(ChangeOrigin::Remote, ChangeKind::Updated, message.timestamp);
            }
            SyncKind::Delete => {
                self.last_applied = message.timestamp;
                if let Err(err) = self.store.remove(&self.key) {
                    warn!("failed to remove '{}' after remote delete: {err}", self.key);
                }
                self.current = self.default.clone();
                self.notify(ChangeOrigin::Remote, ChangeKind::Cleared, message.timestamp);
            }
        }
        true
    }

    fn persist_remote(&self, encoded: &Value) {
        if let Err(err) = self.store.set(&self.key, encoded) {
            warn!("failed to persist remote update for '{}': {err}", self.key);
        }
    }

    /// Wall clock can stand still within a millisecond; stamps stay
    /// strictly increasing per sender so consecutive local writes are
    /// never discarded as stale by a receiver.
    fn next_timestamp(&self) -> i64 {
        Utc::now().timestamp_millis().max(self.last_applied + 1)
    }

    fn notify(&self, origin: ChangeOrigin, kind: ChangeKind, timestamp: i64) {
        self.events.on_change(ChangeEvent {
            key: self.key.clone(),
            origin,
            kind,
            timestamp,
        });
    }
}
