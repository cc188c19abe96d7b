//! Wire model and per-context wiring for synchronization.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::events::{NoopEventSink, SyncEventSink};
use crate::store::DurableStore;
use crate::transport::BroadcastTransport;

/// Single fixed channel shared by every synchronized cell; messages are
/// multiplexed by their own `key` field.
pub const SYNC_CHANNEL: &str = "seatplan-sync";

/// Supported sync operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncKind {
    Update,
    Delete,
}

/// One broadcast state change.
///
/// `Update` carries the full replacement value; `Delete` carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub kind: SyncKind,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Milliseconds since the Unix epoch, strictly increasing per sender.
    pub timestamp: i64,
    pub sender_id: SessionId,
}

impl SyncMessage {
    pub fn update(key: impl Into<String>, value: Value, timestamp: i64, sender_id: SessionId) -> Self {
        Self {
            kind: SyncKind::Update,
            key: key.into(),
            value: Some(value),
            timestamp,
            sender_id,
        }
    }

    pub fn delete(key: impl Into<String>, timestamp: i64, sender_id: SessionId) -> Self {
        Self {
            kind: SyncKind::Delete,
            key: key.into(),
            value: None,
            timestamp,
            sender_id,
        }
    }

    /// Updates must carry a payload and deletes must not.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            SyncKind::Update => self.value.is_some(),
            SyncKind::Delete => self.value.is_none(),
        }
    }
}

/// Echo-suppression identity, generated once per execution context.
///
/// Never persisted; two concurrently open contexts collide with
/// negligible probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-context wiring for synchronized cells: the context's identity plus
/// the shared store, transport, and notification sink handles.
#[derive(Clone)]
pub struct SyncContext {
    pub session_id: SessionId,
    pub store: Arc<dyn DurableStore>,
    pub transport: Arc<dyn BroadcastTransport>,
    pub events: Arc<dyn SyncEventSink>,
}

impl SyncContext {
    pub fn new(store: Arc<dyn DurableStore>, transport: Arc<dyn BroadcastTransport>) -> Self {
        Self {
            session_id: SessionId::generate(),
            store,
            transport,
            events: Arc::new(NoopEventSink),
        }
    }

    /// Replace the notification sink.
    pub fn with_events(mut self, events: Arc<dyn SyncEventSink>) -> Self {
        self.events = events;
        self
    }
}
