use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::OrderEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for order events, one channel per room. This is the seam
/// the notification collaborators (mail sender, front desk board) subscribe
/// on; delivery mechanics live with them.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<OrderEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to events for a room. Creates the channel if needed.
    pub fn subscribe(&self, room_id: Ulid) -> broadcast::Receiver<OrderEvent> {
        let sender = self
            .channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an event. No-op if nobody is listening.
    pub fn send(&self, room_id: Ulid, event: &OrderEvent) {
        if let Some(sender) = self.channels.get(&room_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Remove a channel (e.g. when a room leaves the inventory).
    pub fn remove(&self, room_id: &Ulid) {
        self.channels.remove(room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let room_id = Ulid::new();
        let mut rx = hub.subscribe(room_id);

        let event = OrderEvent::OrderConfirmed {
            order_id: Ulid::new(),
            room_id,
        };
        hub.send(room_id, &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let room_id = Ulid::new();
        // No subscriber — should not panic
        hub.send(
            room_id,
            &OrderEvent::OrderCancelled {
                order_id: Ulid::new(),
                room_id,
            },
        );
    }
}
