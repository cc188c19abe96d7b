//! In-process broadcast hub connecting independent execution contexts.
//!
//! One hub is shared by every context on the device. Each named channel
//! fans a message out to every live subscription; subscribers drain
//! their queue explicitly with `try_next`, so reception never needs an
//! async runtime or a callback registration. Delivery is best-effort: a
//! subscriber that stops draining loses the oldest messages once its
//! buffer fills, and publishing to a channel nobody listens on simply
//! drops the message.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::{self, Receiver, Sender};

use seatplan_core::sync::SyncMessage;
use seatplan_core::transport::{BroadcastSubscription, BroadcastTransport};

/// Buffered messages per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
pub struct BroadcastHub {
    channels: Mutex<HashMap<String, Sender<SyncMessage>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, channel: &str) -> Sender<SyncMessage> {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl BroadcastTransport for BroadcastHub {
    fn publish(&self, channel: &str, message: SyncMessage) {
        // Fire and forget: an error only means nobody is subscribed.
        let _ = self.sender(channel).send(message);
    }

    fn subscribe(&self, channel: &str) -> Box<dyn BroadcastSubscription> {
        Box::new(HubSubscription {
            receiver: self.sender(channel).subscribe(),
        })
    }
}

pub struct HubSubscription {
    receiver: Receiver<SyncMessage>,
}

impl BroadcastSubscription for HubSubscription {
    fn try_next(&mut self) -> Option<SyncMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("subscriber lagged, {skipped} messages dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatplan_core::sync::{SessionId, SyncMessage};
    use serde_json::json;

    fn message(key: &str, timestamp: i64) -> SyncMessage {
        SyncMessage::update(key, json!(timestamp), timestamp, SessionId::generate())
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let hub = BroadcastHub::new();
        hub.publish("quiet", message("k", 1));
    }

    #[test]
    fn subscribers_receive_messages_in_publish_order() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe("orders");
        hub.publish("orders", message("k", 1));
        hub.publish("orders", message("k", 2));

        assert_eq!(sub.try_next().unwrap().timestamp, 1);
        assert_eq!(sub.try_next().unwrap().timestamp, 2);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn late_subscribers_miss_earlier_messages() {
        let hub = BroadcastHub::new();
        hub.publish("late", message("k", 1));
        let mut sub = hub.subscribe("late");
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn channels_are_isolated() {
        let hub = BroadcastHub::new();
        let mut a = hub.subscribe("a");
        let mut b = hub.subscribe("b");
        hub.publish("a", message("k", 1));

        assert!(a.try_next().is_some());
        assert!(b.try_next().is_none());
    }

    #[test]
    fn lagged_subscriber_skips_to_newest_messages() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe("busy");
        let total = CHANNEL_CAPACITY + 50;
        for timestamp in 0..total as i64 {
            hub.publish("busy", message("k", timestamp));
        }

        let mut received = Vec::new();
        while let Some(message) = sub.try_next() {
            received.push(message.timestamp);
        }
        // The oldest messages were dropped but the newest survived.
        assert_eq!(received.last().copied(), Some(total as i64 - 1));
        assert!(received.len() <= CHANNEL_CAPACITY);
        assert!(received.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
