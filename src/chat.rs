use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LimitsConfig;
use crate::db::{
    DatabaseError, DatabaseManager, Message, MessageKind, Notification, Room, RoomKind, RoomStatus,
};
use crate::realtime::{RoomEvent, SubscriptionHub};

pub mod messages;
pub mod notifications;
pub mod rooms;

use self::messages::{MessageDraft, ReactionChange};
use self::rooms::RoomDraft;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("user {user} is not a member of room {room}")]
    NotAMember { user: String, room: String },

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A counterpart (agency, IDO platform, exchange, investor) accepting a
/// founder's pitch for a project.
#[derive(Debug, Clone)]
pub struct AcceptPitch {
    pub project_id: String,
    pub counterpart_id: String,
    pub kind: RoomKind,
}

#[derive(Debug, Clone)]
pub struct AcceptPitchOutcome {
    pub room_id: String,
    pub is_new: bool,
}

fn counterpart_role(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Campaign => "agency",
        RoomKind::Ido => "ido",
        RoomKind::Listing => "exchange",
        RoomKind::Deal => "investor",
        RoomKind::Proposal | RoomKind::Team => "member",
    }
}

/// The messaging/deal-room core. All authoritative state lives in the
/// database; this struct only wires stores, validation, and the in-process
/// event fan-out together.
#[derive(Clone)]
pub struct ChatCore {
    db: Arc<DatabaseManager>,
    hub: Arc<SubscriptionHub>,
    limits: LimitsConfig,
}

impl ChatCore {
    pub fn new(db: Arc<DatabaseManager>, hub: Arc<SubscriptionHub>, limits: LimitsConfig) -> Self {
        Self { db, hub, limits }
    }

    pub fn hub(&self) -> Arc<SubscriptionHub> {
        self.hub.clone()
    }

    /// Idempotent room creation for pitch acceptance. The room id is derived
    /// from (kind, participants, project), so repeated or racing calls
    /// converge on one room; only the call that actually inserted the row
    /// writes the welcome message and notification.
    pub async fn accept_pitch(&self, req: AcceptPitch) -> Result<AcceptPitchOutcome, ChatError> {
        let project = self
            .db
            .project_store()
            .get_project(&req.project_id)
            .await?
            .ok_or_else(|| ChatError::ProjectNotFound(req.project_id.clone()))?;

        let founder_id = project.owner_id.clone();
        if founder_id == req.counterpart_id {
            return Err(ChatError::InvalidInput(
                "a founder cannot accept their own pitch".to_string(),
            ));
        }

        let room_id = rooms::deterministic_room_id(
            req.kind,
            &[founder_id.as_str(), req.counterpart_id.as_str()],
            &req.project_id,
        );

        let mut roles = BTreeMap::new();
        roles.insert(founder_id.clone(), "founder".to_string());
        roles.insert(
            req.counterpart_id.clone(),
            counterpart_role(req.kind).to_string(),
        );

        let now = Utc::now();
        let draft = RoomDraft {
            name: format!("{} · {}", project.name, counterpart_role(req.kind)),
            kind: req.kind,
            owner_id: founder_id.clone(),
            members: vec![founder_id.clone(), req.counterpart_id.clone()],
            roles,
            is_private: true,
            allow_files: true,
            allow_calls: false,
            allow_reactions: true,
            project_id: Some(req.project_id.clone()),
        };
        let room = draft.into_room(room_id.clone(), now)?;

        let is_new = self.db.room_store().create_room_if_absent(&room).await?;

        if is_new {
            info!(room_id = %room_id, project_id = %req.project_id, "deal room created");

            // Welcome message and founder notification are non-critical: the
            // room stays usable without either.
            let welcome = MessageDraft::system(rooms::welcome_message_body(
                req.kind,
                &project.name,
            ));
            if let Err(e) = self.post_message(&room, "system", welcome).await {
                warn!(room_id = %room_id, error = %e, "welcome message write failed");
            }

            let notification = notifications::room_created_notification(
                &founder_id,
                &room,
                &project.name,
                Utc::now(),
            );
            if let Err(e) = self
                .db
                .notification_store()
                .create_notification(&notification)
                .await
            {
                warn!(room_id = %room_id, error = %e, "notification write failed");
            }
        }

        Ok(AcceptPitchOutcome { room_id, is_new })
    }

    pub async fn get_room_for_user(&self, room_id: &str, user_id: &str) -> Result<Room, ChatError> {
        let room = self
            .db
            .room_store()
            .get_room(room_id)
            .await?
            .ok_or_else(|| ChatError::RoomNotFound(room_id.to_string()))?;

        if !room.has_member(user_id) {
            return Err(ChatError::NotAMember {
                user: user_id.to_string(),
                room: room_id.to_string(),
            });
        }

        Ok(room)
    }

    pub async fn get_user_rooms(&self, user_id: &str) -> Result<Vec<Room>, ChatError> {
        Ok(self.db.room_store().get_user_rooms(user_id).await?)
    }

    pub async fn send_message(
        &self,
        room_id: &str,
        sender_id: &str,
        draft: MessageDraft,
    ) -> Result<Message, ChatError> {
        let room = self.get_room_for_user(room_id, sender_id).await?;
        self.post_message(&room, sender_id, draft).await
    }

    async fn post_message(
        &self,
        room: &Room,
        sender_id: &str,
        draft: MessageDraft,
    ) -> Result<Message, ChatError> {
        if matches!(
            draft.kind,
            MessageKind::File | MessageKind::Image | MessageKind::Video | MessageKind::Voice
        ) && !room.allow_files
        {
            return Err(ChatError::InvalidInput(
                "file sharing is disabled in this room".to_string(),
            ));
        }

        draft.validate(self.limits.max_message_length)?;

        let now = Utc::now();
        let message = draft.into_message(&room.room_id, sender_id, now);
        self.db.message_store().append_message(&message).await?;

        // Activity bump is best-effort; the message is already durable.
        if let Err(e) = self.db.room_store().touch(&room.room_id, now).await {
            warn!(room_id = %room.room_id, error = %e, "last-activity update failed");
        }

        self.hub.publish(
            &room.room_id,
            RoomEvent::MessageAppended {
                message: message.clone(),
            },
        );

        Ok(message)
    }

    /// Newest `limit` visible messages, reversed to oldest-first for display.
    pub async fn list_messages(
        &self,
        room_id: &str,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatError> {
        self.get_room_for_user(room_id, user_id).await?;

        let limit = limit
            .unwrap_or(self.limits.message_page_size)
            .clamp(1, 500);
        let mut messages = self.db.message_store().list_visible(room_id, limit).await?;
        messages.reverse();
        Ok(messages)
    }

    async fn get_visible_message(
        &self,
        room_id: &str,
        message_id: &str,
    ) -> Result<Message, ChatError> {
        let message = self
            .db
            .message_store()
            .get_message(room_id, message_id)
            .await?
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;

        if message.is_deleted() {
            return Err(ChatError::MessageNotFound(message_id.to_string()));
        }

        Ok(message)
    }

    pub async fn toggle_reaction(
        &self,
        room_id: &str,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<(Message, ReactionChange), ChatError> {
        let room = self.get_room_for_user(room_id, user_id).await?;
        if !room.allow_reactions {
            return Err(ChatError::InvalidInput(
                "reactions are disabled in this room".to_string(),
            ));
        }
        if emoji.is_empty() {
            return Err(ChatError::InvalidInput("emoji cannot be empty".to_string()));
        }

        let mut message = self.get_visible_message(room_id, message_id).await?;
        let change = messages::toggle_reaction(&mut message.reactions, emoji, user_id);
        self.db.message_store().update_message(&message).await?;

        self.hub.publish(
            room_id,
            RoomEvent::MessageUpdated {
                message: message.clone(),
            },
        );

        Ok((message, change))
    }

    pub async fn mark_message_read(
        &self,
        room_id: &str,
        message_id: &str,
        user_id: &str,
    ) -> Result<(), ChatError> {
        self.get_room_for_user(room_id, user_id).await?;

        let mut message = self.get_visible_message(room_id, message_id).await?;
        if messages::mark_read(&mut message.read_by, user_id) {
            self.db.message_store().update_message(&message).await?;
            self.hub
                .publish(room_id, RoomEvent::MessageUpdated { message });
        }

        Ok(())
    }

    pub async fn edit_message(
        &self,
        room_id: &str,
        message_id: &str,
        user_id: &str,
        body: String,
    ) -> Result<Message, ChatError> {
        self.get_room_for_user(room_id, user_id).await?;

        let mut message = self.get_visible_message(room_id, message_id).await?;
        if message.sender_id != user_id {
            return Err(ChatError::Forbidden(
                "only the sender can edit a message".to_string(),
            ));
        }

        let draft = MessageDraft::text(body.clone());
        draft.validate(self.limits.max_message_length)?;

        messages::apply_edit(&mut message, body, Utc::now());
        self.db.message_store().update_message(&message).await?;

        self.hub.publish(
            room_id,
            RoomEvent::MessageUpdated {
                message: message.clone(),
            },
        );

        Ok(message)
    }

    /// Any member can pin or unpin; the flag lives on the message itself.
    pub async fn toggle_pin(
        &self,
        room_id: &str,
        message_id: &str,
        user_id: &str,
    ) -> Result<Message, ChatError> {
        self.get_room_for_user(room_id, user_id).await?;

        let mut message = self.get_visible_message(room_id, message_id).await?;
        message.pinned = !message.pinned;
        self.db.message_store().update_message(&message).await?;

        self.hub.publish(
            room_id,
            RoomEvent::MessageUpdated {
                message: message.clone(),
            },
        );

        Ok(message)
    }

    pub async fn delete_message(
        &self,
        room_id: &str,
        message_id: &str,
        user_id: &str,
    ) -> Result<(), ChatError> {
        self.get_room_for_user(room_id, user_id).await?;

        let mut message = self.get_visible_message(room_id, message_id).await?;
        if message.sender_id != user_id {
            return Err(ChatError::Forbidden(
                "only the sender can delete a message".to_string(),
            ));
        }

        messages::apply_soft_delete(&mut message, Utc::now());
        self.db.message_store().update_message(&message).await?;

        self.hub.publish(
            room_id,
            RoomEvent::MessageDeleted {
                room_id: room_id.to_string(),
                message_id: message_id.to_string(),
            },
        );

        Ok(())
    }

    /// Owner-only status transition. Closing or archiving a room drops it
    /// from everyone's room list; reopening restores it.
    pub async fn set_room_status(
        &self,
        room_id: &str,
        user_id: &str,
        status: RoomStatus,
    ) -> Result<Room, ChatError> {
        let mut room = self.get_room_for_user(room_id, user_id).await?;
        if room.owner_id != user_id {
            return Err(ChatError::Forbidden(
                "only the room owner can change its status".to_string(),
            ));
        }

        self.db.room_store().update_status(room_id, status).await?;
        room.status = status;

        self.hub
            .publish(room_id, RoomEvent::RoomUpdated { room: room.clone() });

        Ok(room)
    }

    pub async fn list_notifications(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Notification>, ChatError> {
        Ok(self
            .db
            .notification_store()
            .list_for_user(user_id, limit.clamp(1, 200))
            .await?)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: &str,
        user_id: &str,
    ) -> Result<bool, ChatError> {
        Ok(self
            .db
            .notification_store()
            .mark_read(notification_id, user_id)
            .await?)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use chrono::Utc;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::Project;

    async fn test_core() -> (NamedTempFile, ChatCore) {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = DatabaseConfig {
            url: None,
            filename: Some(file.path().to_string_lossy().to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        };
        let db = Arc::new(DatabaseManager::new(&config).await.expect("db manager"));
        db.migrate().await.expect("migrate");

        let core = ChatCore::new(
            db.clone(),
            Arc::new(SubscriptionHub::new(16)),
            LimitsConfig::default(),
        );

        let project = Project {
            id: 0,
            project_id: "p1".to_string(),
            owner_id: "f1".to_string(),
            name: "Nebula Protocol".to_string(),
            token_symbol: "NEB".to_string(),
            sector: "DeFi".to_string(),
            stage: "seed".to_string(),
            description: "Cross-chain liquidity aggregation".to_string(),
            website: Some("https://nebula.example".to_string()),
            whitepaper_url: None,
            audited: true,
            kyc_verified: true,
            team_public: true,
            target_raise_usd: 2_000_000,
            created_at: Utc::now(),
        };
        db.project_store()
            .create_project_if_absent(&project)
            .await
            .expect("seed project");

        (file, core)
    }

    #[tokio::test]
    async fn accept_pitch_twice_creates_one_room_and_one_welcome_message() {
        let (_file, core) = test_core().await;

        let req = AcceptPitch {
            project_id: "p1".to_string(),
            counterpart_id: "a1".to_string(),
            kind: RoomKind::Campaign,
        };

        let first = core.accept_pitch(req.clone()).await.expect("first accept");
        let second = core.accept_pitch(req).await.expect("second accept");

        assert!(first.is_new);
        assert!(!second.is_new);
        assert_eq!(first.room_id, second.room_id);

        let messages = core
            .list_messages(&first.room_id, "f1", None)
            .await
            .expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::System);

        let notifications = core.list_notifications("f1", 10).await.expect("list");
        assert_eq!(notifications.len(), 1);
    }

    #[tokio::test]
    async fn accept_pitch_rejects_unknown_project_and_self_accept() {
        let (_file, core) = test_core().await;

        let missing = core
            .accept_pitch(AcceptPitch {
                project_id: "nope".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Campaign,
            })
            .await
            .expect_err("unknown project");
        assert!(matches!(missing, ChatError::ProjectNotFound(_)));

        let own = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "f1".to_string(),
                kind: RoomKind::Campaign,
            })
            .await
            .expect_err("self accept");
        assert!(matches!(own, ChatError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn reaction_toggle_round_trips_through_the_store() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let message = core
            .send_message(&outcome.room_id, "f1", MessageDraft::text("hello"))
            .await
            .expect("send");

        let (after_add, change) = core
            .toggle_reaction(&outcome.room_id, &message.message_id, "a1", "👍")
            .await
            .expect("add reaction");
        assert_eq!(change, ReactionChange::Added);
        assert_eq!(
            after_add.reactions.get("👍"),
            Some(&vec!["a1".to_string()])
        );

        let (after_remove, change) = core
            .toggle_reaction(&outcome.room_id, &message.message_id, "a1", "👍")
            .await
            .expect("remove reaction");
        assert_eq!(change, ReactionChange::Removed);
        assert!(after_remove.reactions.is_empty());
    }

    #[tokio::test]
    async fn non_members_cannot_read_or_write() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let err = core
            .send_message(&outcome.room_id, "intruder", MessageDraft::text("hi"))
            .await
            .expect_err("not a member");
        assert!(matches!(err, ChatError::NotAMember { .. }));

        let err = core
            .list_messages(&outcome.room_id, "intruder", None)
            .await
            .expect_err("not a member");
        assert!(matches!(err, ChatError::NotAMember { .. }));
    }

    #[tokio::test]
    async fn deleted_messages_disappear_from_listing_and_reactions() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let message = core
            .send_message(&outcome.room_id, "f1", MessageDraft::text("oops"))
            .await
            .expect("send");

        core.delete_message(&outcome.room_id, &message.message_id, "f1")
            .await
            .expect("delete");

        let listed = core
            .list_messages(&outcome.room_id, "f1", None)
            .await
            .expect("list");
        assert!(listed.iter().all(|m| m.message_id != message.message_id));

        let err = core
            .toggle_reaction(&outcome.room_id, &message.message_id, "a1", "👍")
            .await
            .expect_err("deleted message");
        assert!(matches!(err, ChatError::MessageNotFound(_)));
    }

    #[tokio::test]
    async fn pin_toggle_flips_the_flag() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let message = core
            .send_message(&outcome.room_id, "f1", MessageDraft::text("pin me"))
            .await
            .expect("send");
        assert!(!message.pinned);

        let pinned = core
            .toggle_pin(&outcome.room_id, &message.message_id, "a1")
            .await
            .expect("pin");
        assert!(pinned.pinned);

        let unpinned = core
            .toggle_pin(&outcome.room_id, &message.message_id, "a1")
            .await
            .expect("unpin");
        assert!(!unpinned.pinned);
    }

    #[tokio::test]
    async fn only_the_owner_can_close_a_room() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let err = core
            .set_room_status(&outcome.room_id, "a1", RoomStatus::Closed)
            .await
            .expect_err("counterpart is not the owner");
        assert!(matches!(err, ChatError::Forbidden(_)));

        let closed = core
            .set_room_status(&outcome.room_id, "f1", RoomStatus::Closed)
            .await
            .expect("owner closes");
        assert_eq!(closed.status, RoomStatus::Closed);

        let rooms = core.get_user_rooms("f1").await.expect("rooms");
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn only_the_sender_may_edit_or_delete() {
        let (_file, core) = test_core().await;

        let outcome = core
            .accept_pitch(AcceptPitch {
                project_id: "p1".to_string(),
                counterpart_id: "a1".to_string(),
                kind: RoomKind::Deal,
            })
            .await
            .expect("accept");

        let message = core
            .send_message(&outcome.room_id, "f1", MessageDraft::text("draft terms"))
            .await
            .expect("send");

        let err = core
            .edit_message(&outcome.room_id, &message.message_id, "a1", "new".to_string())
            .await
            .expect_err("not the sender");
        assert!(matches!(err, ChatError::Forbidden(_)));

        let edited = core
            .edit_message(
                &outcome.room_id,
                &message.message_id,
                "f1",
                "final terms".to_string(),
            )
            .await
            .expect("sender edit");
        assert_eq!(edited.body.as_deref(), Some("final terms"));
        assert!(edited.edited_at.is_some());
    }
}
