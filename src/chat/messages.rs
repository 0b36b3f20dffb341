use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Message, MessageKind};

use super::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
}

/// Unvalidated message input as it arrives from the API.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub kind: MessageKind,
    pub body: Option<String>,
    pub attachments: Vec<String>,
    pub reply_to: Option<String>,
}

impl MessageDraft {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Text,
            body: Some(body.into()),
            attachments: Vec::new(),
            reply_to: None,
        }
    }

    pub fn system(body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            body: Some(body.into()),
            attachments: Vec::new(),
            reply_to: None,
        }
    }

    pub fn validate(&self, max_body_length: usize) -> Result<(), ChatError> {
        let body_len = self.body.as_deref().map(str::len).unwrap_or(0);

        if body_len > max_body_length {
            return Err(ChatError::InvalidInput(format!(
                "message body exceeds {max_body_length} characters"
            )));
        }

        match self.kind {
            MessageKind::Text | MessageKind::System | MessageKind::AiReply => {
                if self.body.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err(ChatError::InvalidInput(
                        "message body cannot be empty".to_string(),
                    ));
                }
            }
            MessageKind::File
            | MessageKind::Image
            | MessageKind::Video
            | MessageKind::Voice => {
                if self.attachments.is_empty() {
                    return Err(ChatError::InvalidInput(
                        "attachment messages need at least one attachment".to_string(),
                    ));
                }
            }
            MessageKind::Poll | MessageKind::Task | MessageKind::Event => {}
        }

        Ok(())
    }

    pub fn into_message(
        self,
        room_id: &str,
        sender_id: &str,
        now: DateTime<Utc>,
    ) -> Message {
        Message {
            id: 0,
            message_id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            sender_id: sender_id.to_string(),
            kind: self.kind,
            body: self.body,
            attachments: self.attachments,
            reply_to: self.reply_to,
            reactions: BTreeMap::new(),
            read_by: vec![sender_id.to_string()],
            pinned: false,
            created_at: now,
            edited_at: None,
            deleted_at: None,
        }
    }
}

/// Set XOR: a present reactor is removed, an absent one added. Emoji entries
/// with no reactors left are dropped from the map entirely.
pub fn toggle_reaction(
    reactions: &mut BTreeMap<String, Vec<String>>,
    emoji: &str,
    user_id: &str,
) -> ReactionChange {
    let reactors = reactions.entry(emoji.to_string()).or_default();

    if let Some(pos) = reactors.iter().position(|r| r == user_id) {
        reactors.remove(pos);
        if reactors.is_empty() {
            reactions.remove(emoji);
        }
        ReactionChange::Removed
    } else {
        reactors.push(user_id.to_string());
        ReactionChange::Added
    }
}

/// Adds the reader to the read-by set if absent. Returns whether anything
/// changed.
pub fn mark_read(read_by: &mut Vec<String>, user_id: &str) -> bool {
    if read_by.iter().any(|r| r == user_id) {
        false
    } else {
        read_by.push(user_id.to_string());
        true
    }
}

pub fn apply_edit(message: &mut Message, body: String, now: DateTime<Utc>) {
    message.body = Some(body);
    message.edited_at = Some(now);
}

pub fn apply_soft_delete(message: &mut Message, now: DateTime<Utc>) {
    message.deleted_at = Some(now);
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn double_toggle_restores_original_state() {
        let mut reactions = BTreeMap::new();

        assert_eq!(
            toggle_reaction(&mut reactions, "👍", "u1"),
            ReactionChange::Added
        );
        assert_eq!(reactions.get("👍"), Some(&vec!["u1".to_string()]));

        assert_eq!(
            toggle_reaction(&mut reactions, "👍", "u1"),
            ReactionChange::Removed
        );
        assert!(reactions.is_empty());
    }

    #[test]
    fn toggle_only_affects_the_toggling_user() {
        let mut reactions = BTreeMap::new();
        toggle_reaction(&mut reactions, "🚀", "u1");
        toggle_reaction(&mut reactions, "🚀", "u2");
        toggle_reaction(&mut reactions, "🚀", "u1");

        assert_eq!(reactions.get("🚀"), Some(&vec!["u2".to_string()]));
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut read_by = Vec::new();
        assert!(mark_read(&mut read_by, "u1"));
        assert!(!mark_read(&mut read_by, "u1"));
        assert_eq!(read_by, vec!["u1".to_string()]);
    }

    #[test]
    fn text_draft_requires_nonempty_body() {
        let draft = MessageDraft::text("   ");
        assert!(draft.validate(4000).is_err());

        let draft = MessageDraft::text("hello");
        assert!(draft.validate(4000).is_ok());
    }

    #[test]
    fn oversize_body_is_rejected() {
        let draft = MessageDraft::text("a".repeat(41));
        assert!(draft.validate(40).is_err());
    }

    #[test_case(MessageKind::File)]
    #[test_case(MessageKind::Image)]
    #[test_case(MessageKind::Video)]
    #[test_case(MessageKind::Voice)]
    fn attachment_kinds_require_attachments(kind: MessageKind) {
        let draft = MessageDraft {
            kind,
            body: None,
            attachments: Vec::new(),
            reply_to: None,
        };
        assert!(draft.validate(4000).is_err());
    }

    #[test]
    fn sender_has_read_their_own_message() {
        let message =
            MessageDraft::text("hi").into_message("room-1", "u1", Utc::now());
        assert_eq!(message.read_by, vec!["u1".to_string()]);
        assert!(!message.is_deleted());
    }

    #[test]
    fn soft_delete_stamps_timestamp_only() {
        let mut message =
            MessageDraft::text("hi").into_message("room-1", "u1", Utc::now());
        apply_soft_delete(&mut message, Utc::now());
        assert!(message.is_deleted());
        assert_eq!(message.body.as_deref(), Some("hi"));
    }
}
