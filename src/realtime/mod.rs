use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::db::{Message, Room};

/// Change notification fanned out to everyone watching a room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RoomEvent {
    MessageAppended { message: Message },
    MessageUpdated { message: Message },
    MessageDeleted { room_id: String, message_id: String },
    RoomUpdated { room: Room },
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::MessageAppended { .. } => "message-appended",
            RoomEvent::MessageUpdated { .. } => "message-updated",
            RoomEvent::MessageDeleted { .. } => "message-deleted",
            RoomEvent::RoomUpdated { .. } => "room-updated",
        }
    }
}

/// In-process fan-out of room changes. Each room lazily owns a broadcast
/// channel; channels are pruned once the last receiver is gone. A slow
/// subscriber that lags the buffer skips ahead and keeps going, it is never
/// disconnected.
pub struct SubscriptionHub {
    buffer: usize,
    channels: RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>,
}

impl SubscriptionHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        if let Some(tx) = self.channels.read().get(room_id) {
            return tx.subscribe();
        }

        let mut channels = self.channels.write();
        channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe()
    }

    /// Returns how many subscribers the event reached. Publishing to a room
    /// nobody watches is a no-op.
    pub fn publish(&self, room_id: &str, event: RoomEvent) -> usize {
        let delivered = {
            let channels = self.channels.read();
            match channels.get(room_id) {
                Some(tx) => tx.send(event).unwrap_or(0),
                None => return 0,
            }
        };

        if delivered == 0 {
            // Re-check under the write lock: a subscriber may have arrived
            // between the failed send and now.
            let mut channels = self.channels.write();
            if let Some(tx) = channels.get(room_id) {
                if tx.receiver_count() == 0 {
                    channels.remove(room_id);
                    debug!(room_id, "pruned idle room channel");
                }
            }
        }

        delivered
    }

    pub fn active_rooms(&self) -> usize {
        self.channels.read().len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::{RoomEvent, SubscriptionHub};
    use crate::db::{Message, MessageKind};

    fn sample_message(room_id: &str) -> Message {
        Message {
            id: 0,
            message_id: "msg-1".to_string(),
            room_id: room_id.to_string(),
            sender_id: "u1".to_string(),
            kind: MessageKind::Text,
            body: Some("hello".to_string()),
            attachments: Vec::new(),
            reply_to: None,
            reactions: BTreeMap::new(),
            read_by: Vec::new(),
            pinned: false,
            created_at: Utc::now(),
            edited_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = SubscriptionHub::new(16);
        let mut rx_a = hub.subscribe("room-1");
        let mut rx_b = hub.subscribe("room-1");

        let delivered = hub.publish(
            "room-1",
            RoomEvent::MessageAppended {
                message: sample_message("room-1"),
            },
        );
        assert_eq!(delivered, 2);

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.try_recv().expect("event delivered") {
                RoomEvent::MessageAppended { message } => {
                    assert_eq!(message.room_id, "room-1");
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn publishing_to_unwatched_room_is_noop() {
        let hub = SubscriptionHub::new(16);
        let delivered = hub.publish(
            "room-ghost",
            RoomEvent::MessageDeleted {
                room_id: "room-ghost".to_string(),
                message_id: "msg-1".to_string(),
            },
        );
        assert_eq!(delivered, 0);
        assert_eq!(hub.active_rooms(), 0);
    }

    #[tokio::test]
    async fn events_are_scoped_to_their_room() {
        let hub = SubscriptionHub::new(16);
        let mut rx_other = hub.subscribe("room-2");

        hub.subscribe("room-1");
        hub.publish(
            "room-1",
            RoomEvent::MessageAppended {
                message: sample_message("room-1"),
            },
        );

        assert!(matches!(rx_other.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn idle_channels_are_pruned_after_publish() {
        let hub = SubscriptionHub::new(16);
        let rx = hub.subscribe("room-1");
        assert_eq!(hub.active_rooms(), 1);
        drop(rx);

        hub.publish(
            "room-1",
            RoomEvent::MessageAppended {
                message: sample_message("room-1"),
            },
        );
        assert_eq!(hub.active_rooms(), 0);
    }
}
