use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Deal,
    Listing,
    Ido,
    Campaign,
    Proposal,
    Team,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Deal => "deal",
            RoomKind::Listing => "listing",
            RoomKind::Ido => "ido",
            RoomKind::Campaign => "campaign",
            RoomKind::Proposal => "proposal",
            RoomKind::Team => "team",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deal" => Some(RoomKind::Deal),
            "listing" => Some(RoomKind::Listing),
            "ido" => Some(RoomKind::Ido),
            "campaign" => Some(RoomKind::Campaign),
            "proposal" => Some(RoomKind::Proposal),
            "team" => Some(RoomKind::Team),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Active,
    Closed,
    Archived,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Active => "active",
            RoomStatus::Closed => "closed",
            RoomStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(RoomStatus::Active),
            "closed" => Some(RoomStatus::Closed),
            "archived" => Some(RoomStatus::Archived),
            _ => None,
        }
    }
}

/// A persisted conversation context between two or more parties, optionally
/// scoped to a project. `members` keeps display order; membership checks go
/// through [`Room::has_member`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub room_id: String,
    pub name: String,
    pub kind: RoomKind,
    pub owner_id: String,
    pub members: Vec<String>,
    pub roles: BTreeMap<String, String>,
    pub is_private: bool,
    pub allow_files: bool,
    pub allow_calls: bool,
    pub allow_reactions: bool,
    pub status: RoomStatus,
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Room {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Text,
    File,
    Image,
    Video,
    Voice,
    Poll,
    Task,
    Event,
    AiReply,
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::File => "file",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
            MessageKind::Voice => "voice",
            MessageKind::Poll => "poll",
            MessageKind::Task => "task",
            MessageKind::Event => "event",
            MessageKind::AiReply => "ai-reply",
            MessageKind::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(MessageKind::Text),
            "file" => Some(MessageKind::File),
            "image" => Some(MessageKind::Image),
            "video" => Some(MessageKind::Video),
            "voice" => Some(MessageKind::Voice),
            "poll" => Some(MessageKind::Poll),
            "task" => Some(MessageKind::Task),
            "event" => Some(MessageKind::Event),
            "ai-reply" => Some(MessageKind::AiReply),
            "system" => Some(MessageKind::System),
            _ => None,
        }
    }
}

/// One entry in a room's append-only log. Deletion is soft: `deleted_at` is
/// stamped and every read path filters the row out, the row itself stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub message_id: String,
    pub room_id: String,
    pub sender_id: String,
    pub kind: MessageKind,
    pub body: Option<String>,
    pub attachments: Vec<String>,
    pub reply_to: Option<String>,
    pub reactions: BTreeMap<String, Vec<String>>,
    pub read_by: Vec<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(NotificationPriority::Low),
            "normal" => Some(NotificationPriority::Normal),
            "high" => Some(NotificationPriority::High),
            _ => None,
        }
    }
}

/// Created by the server when something of interest happens to a user,
/// mutated only by marking read, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub notification_id: String,
    pub user_id: String,
    pub source: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub project_id: String,
    pub owner_id: String,
    pub name: String,
    pub token_symbol: String,
    pub sector: String,
    pub stage: String,
    pub description: String,
    pub website: Option<String>,
    pub whitepaper_url: Option<String>,
    pub audited: bool,
    pub kyc_verified: bool,
    pub team_public: bool,
    pub target_raise_usd: i64,
    pub created_at: DateTime<Utc>,
}

// JSON helpers shared by the backends. Collection-valued fields live in TEXT
// columns, mirroring the document-store shape they came from.

pub(crate) fn encode_string_vec(values: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(values).map_err(|e| DatabaseError::Query(e.to_string()))
}

pub(crate) fn parse_string_vec(raw: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::Query(format!("invalid list column: {e}")))
}

pub(crate) fn encode_string_map(values: &BTreeMap<String, String>) -> Result<String, DatabaseError> {
    serde_json::to_string(values).map_err(|e| DatabaseError::Query(e.to_string()))
}

pub(crate) fn parse_string_map(raw: &str) -> Result<BTreeMap<String, String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::Query(format!("invalid map column: {e}")))
}

pub(crate) fn encode_reactions(
    values: &BTreeMap<String, Vec<String>>,
) -> Result<String, DatabaseError> {
    serde_json::to_string(values).map_err(|e| DatabaseError::Query(e.to_string()))
}

pub(crate) fn parse_reactions(
    raw: &str,
) -> Result<BTreeMap<String, Vec<String>>, DatabaseError> {
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::Query(format!("invalid reactions column: {e}")))
}

pub(crate) fn parse_room_kind(raw: &str) -> Result<RoomKind, DatabaseError> {
    RoomKind::parse(raw).ok_or_else(|| DatabaseError::Query(format!("unknown room kind: {raw}")))
}

pub(crate) fn parse_room_status(raw: &str) -> Result<RoomStatus, DatabaseError> {
    RoomStatus::parse(raw)
        .ok_or_else(|| DatabaseError::Query(format!("unknown room status: {raw}")))
}

pub(crate) fn parse_message_kind(raw: &str) -> Result<MessageKind, DatabaseError> {
    MessageKind::parse(raw)
        .ok_or_else(|| DatabaseError::Query(format!("unknown message kind: {raw}")))
}

pub(crate) fn parse_priority(raw: &str) -> Result<NotificationPriority, DatabaseError> {
    NotificationPriority::parse(raw)
        .ok_or_else(|| DatabaseError::Query(format!("unknown notification priority: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_kind_round_trips_through_str() {
        for kind in [
            RoomKind::Deal,
            RoomKind::Listing,
            RoomKind::Ido,
            RoomKind::Campaign,
            RoomKind::Proposal,
            RoomKind::Team,
        ] {
            assert_eq!(RoomKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RoomKind::parse("escrow"), None);
    }

    #[test]
    fn message_kind_round_trips_through_str() {
        for kind in [
            MessageKind::Text,
            MessageKind::File,
            MessageKind::Image,
            MessageKind::Video,
            MessageKind::Voice,
            MessageKind::Poll,
            MessageKind::Task,
            MessageKind::Event,
            MessageKind::AiReply,
            MessageKind::System,
        ] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn reactions_encoding_is_stable() {
        let mut reactions = BTreeMap::new();
        reactions.insert("👍".to_string(), vec!["u1".to_string(), "u2".to_string()]);
        reactions.insert("🚀".to_string(), vec!["u3".to_string()]);

        let encoded = encode_reactions(&reactions).expect("encode");
        let decoded = parse_reactions(&encoded).expect("decode");
        assert_eq!(decoded, reactions);
    }

    #[test]
    fn malformed_list_column_is_a_query_error() {
        let err = parse_string_vec("{not json").expect_err("must fail");
        assert!(matches!(err, DatabaseError::Query(_)));
    }
}
