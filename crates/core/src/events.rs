//! Change notifications emitted after applied mutations.
//!
//! Runtime bridges implement [`SyncEventSink`] to re-render and, for
//! remote changes, surface a user-visible notice. The sink is invoked
//! after the cell's state is already updated, never before.

use serde::{Deserialize, Serialize};

/// Where an applied change originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    Local,
    Remote,
}

/// What happened to the cell's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Updated,
    Cleared,
}

/// One applied change to a synchronized cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub key: String,
    pub origin: ChangeOrigin,
    pub kind: ChangeKind,
    pub timestamp: i64,
}

/// Sink for applied-change notifications.
pub trait SyncEventSink: Send + Sync {
    fn on_change(&self, event: ChangeEvent);
}

/// Sink that drops every notification.
#[derive(Debug, Default)]
pub struct NoopEventSink;

impl SyncEventSink for NoopEventSink {
    fn on_change(&self, _event: ChangeEvent) {}
}
