//! Broadcast transport contract between execution contexts.
//!
//! Delivery is fire-and-forget and best-effort; the only ordering
//! guarantee is FIFO per sender within one channel. Reception is a
//! queue drained by an explicit event-processing step (no callbacks),
//! which keeps ordering and teardown in the caller's hands.

use crate::sync::SyncMessage;

/// Live subscription to one named channel.
///
/// Dropping the subscription releases its channel slot.
pub trait BroadcastSubscription: Send {
    /// Next pending message, if any. Never blocks.
    fn try_next(&mut self) -> Option<SyncMessage>;
}

/// Publish/subscribe transport shared by every context on the device.
pub trait BroadcastTransport: Send + Sync {
    fn publish(&self, channel: &str, message: SyncMessage);
    fn subscribe(&self, channel: &str) -> Box<dyn BroadcastSubscription>;
}

/// Transport for hosts without a broadcast primitive.
///
/// Publishing drops the message and subscriptions never yield one; the
/// system degrades to single-context operation.
#[derive(Debug, Default)]
pub struct NullTransport;

impl BroadcastTransport for NullTransport {
    fn publish(&self, _channel: &str, _message: SyncMessage) {}

    fn subscribe(&self, _channel: &str) -> Box<dyn BroadcastSubscription> {
        Box::new(NullSubscription)
    }
}

struct NullSubscription;

impl BroadcastSubscription for NullSubscription {
    fn try_next(&mut self) -> Option<SyncMessage> {
        None
    }
}
