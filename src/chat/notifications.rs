use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Notification, NotificationPriority, Room, RoomKind};

/// Notification for the founder when a counterpart opens a room by accepting
/// a pitch.
pub fn room_created_notification(
    target_user: &str,
    room: &Room,
    project_name: &str,
    now: DateTime<Utc>,
) -> Notification {
    let (source, title) = match room.kind {
        RoomKind::Ido => ("ido_room", "IDO pitch accepted"),
        RoomKind::Campaign => ("campaign_room", "Campaign pitch accepted"),
        RoomKind::Listing => ("listing_room", "Listing request accepted"),
        _ => ("deal_room", "Pitch accepted"),
    };

    Notification {
        id: 0,
        notification_id: Uuid::new_v4().to_string(),
        user_id: target_user.to_string(),
        source: source.to_string(),
        title: title.to_string(),
        body: format!("A new room for {project_name} is ready: {}", room.name),
        read: false,
        priority: NotificationPriority::High,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::db::RoomStatus;

    use super::*;

    fn room(kind: RoomKind) -> Room {
        Room {
            id: 0,
            room_id: "room-1".to_string(),
            name: "Nebula x StellarPR".to_string(),
            kind,
            owner_id: "f1".to_string(),
            members: vec!["f1".to_string(), "a1".to_string()],
            roles: BTreeMap::new(),
            is_private: true,
            allow_files: true,
            allow_calls: false,
            allow_reactions: true,
            status: RoomStatus::Active,
            project_id: Some("p1".to_string()),
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
        }
    }

    #[test]
    fn notification_targets_the_founder_unread() {
        let n = room_created_notification("f1", &room(RoomKind::Campaign), "Nebula", Utc::now());
        assert_eq!(n.user_id, "f1");
        assert!(!n.read);
        assert_eq!(n.source, "campaign_room");
        assert!(n.body.contains("Nebula"));
    }

    #[test]
    fn source_follows_room_kind() {
        assert_eq!(
            room_created_notification("f1", &room(RoomKind::Ido), "Nebula", Utc::now()).source,
            "ido_room"
        );
        assert_eq!(
            room_created_notification("f1", &room(RoomKind::Deal), "Nebula", Utc::now()).source,
            "deal_room"
        );
    }
}
