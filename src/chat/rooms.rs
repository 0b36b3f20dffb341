use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::db::{Room, RoomKind, RoomStatus};

use super::ChatError;

/// Room id for a formal connection between parties over a project. The id is
/// a pure function of (kind, participants, project), with participants
/// sorted, so two racing accept-pitch requests always target the same row.
pub fn deterministic_room_id(
    kind: RoomKind,
    participants: &[&str],
    project_id: &str,
) -> String {
    let mut sorted: Vec<&str> = participants.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    for participant in sorted {
        hasher.update(b"\x1f");
        hasher.update(participant.as_bytes());
    }
    hasher.update(b"\x1f");
    hasher.update(project_id.as_bytes());

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest.iter().take(16) {
        hex.push_str(&format!("{:02x}", byte));
    }
    format!("{}-{}", kind.as_str(), hex)
}

/// Validated input for room creation.
#[derive(Debug, Clone)]
pub struct RoomDraft {
    pub name: String,
    pub kind: RoomKind,
    pub owner_id: String,
    pub members: Vec<String>,
    pub roles: BTreeMap<String, String>,
    pub is_private: bool,
    pub allow_files: bool,
    pub allow_calls: bool,
    pub allow_reactions: bool,
    pub project_id: Option<String>,
}

impl RoomDraft {
    /// Builds the persistable room, rejecting drafts whose owner is not a
    /// member. Member order is preserved for display, duplicates dropped.
    pub fn into_room(self, room_id: String, now: DateTime<Utc>) -> Result<Room, ChatError> {
        let mut members = Vec::with_capacity(self.members.len());
        for member in self.members {
            if member.is_empty() {
                return Err(ChatError::InvalidInput(
                    "member ids cannot be empty".to_string(),
                ));
            }
            if !members.contains(&member) {
                members.push(member);
            }
        }

        if members.is_empty() {
            return Err(ChatError::InvalidInput(
                "a room needs at least one member".to_string(),
            ));
        }

        if !members.iter().any(|m| *m == self.owner_id) {
            return Err(ChatError::InvalidInput(format!(
                "room owner {} must be a member",
                self.owner_id
            )));
        }

        Ok(Room {
            id: 0,
            room_id,
            name: self.name,
            kind: self.kind,
            owner_id: self.owner_id,
            members,
            roles: self.roles,
            is_private: self.is_private,
            allow_files: self.allow_files,
            allow_calls: self.allow_calls,
            allow_reactions: self.allow_reactions,
            status: RoomStatus::Active,
            project_id: self.project_id,
            created_at: now,
            last_activity_at: now,
        })
    }
}

/// First system message posted into a freshly created room.
pub fn welcome_message_body(kind: RoomKind, project_name: &str) -> String {
    match kind {
        RoomKind::Deal => format!(
            "Deal room opened for {project_name}. Share your terms and documents here."
        ),
        RoomKind::Ido => format!(
            "IDO launch room opened for {project_name}. Coordinate your launch schedule here."
        ),
        RoomKind::Campaign => format!(
            "Campaign room opened for {project_name}. Plan your campaign here."
        ),
        RoomKind::Listing => format!(
            "Listing room opened for {project_name}. Exchange requirements go here."
        ),
        RoomKind::Proposal => format!("Proposal room opened for {project_name}."),
        RoomKind::Team => format!("Team room opened for {project_name}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(owner: &str, members: &[&str]) -> RoomDraft {
        RoomDraft {
            name: "Nebula deal".to_string(),
            kind: RoomKind::Deal,
            owner_id: owner.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            roles: BTreeMap::new(),
            is_private: true,
            allow_files: true,
            allow_calls: false,
            allow_reactions: true,
            project_id: Some("p1".to_string()),
        }
    }

    #[test]
    fn room_id_ignores_participant_order() {
        let a = deterministic_room_id(RoomKind::Campaign, &["f1", "a1"], "p1");
        let b = deterministic_room_id(RoomKind::Campaign, &["a1", "f1"], "p1");
        assert_eq!(a, b);
        assert!(a.starts_with("campaign-"));
    }

    #[test]
    fn room_id_distinguishes_projects_and_kinds() {
        let base = deterministic_room_id(RoomKind::Deal, &["f1", "a1"], "p1");
        assert_ne!(
            base,
            deterministic_room_id(RoomKind::Deal, &["f1", "a1"], "p2")
        );
        assert_ne!(
            base,
            deterministic_room_id(RoomKind::Ido, &["f1", "a1"], "p1")
        );
        assert_ne!(
            base,
            deterministic_room_id(RoomKind::Deal, &["f1", "a2"], "p1")
        );
    }

    #[test]
    fn room_id_is_ambiguity_free_for_joined_ids() {
        // Separator matters: ("ab", "c") must differ from ("a", "bc").
        let a = deterministic_room_id(RoomKind::Deal, &["ab", "c"], "p1");
        let b = deterministic_room_id(RoomKind::Deal, &["a", "bc"], "p1");
        assert_ne!(a, b);
    }

    #[test]
    fn draft_requires_owner_in_members() {
        let err = draft("f1", &["a1", "b1"])
            .into_room("room-x".to_string(), Utc::now())
            .expect_err("owner missing");
        assert!(matches!(err, ChatError::InvalidInput(_)));
    }

    #[test]
    fn draft_deduplicates_members_preserving_order() {
        let room = draft("f1", &["f1", "a1", "f1", "a1"])
            .into_room("room-x".to_string(), Utc::now())
            .expect("valid draft");
        assert_eq!(room.members, vec!["f1".to_string(), "a1".to_string()]);
        assert_eq!(room.status, RoomStatus::Active);
    }

    #[test]
    fn draft_rejects_empty_member_ids() {
        let err = draft("f1", &["f1", ""])
            .into_room("room-x".to_string(), Utc::now())
            .expect_err("empty member id");
        assert!(matches!(err, ChatError::InvalidInput(_)));
    }

    #[test]
    fn welcome_message_names_the_project() {
        let body = welcome_message_body(RoomKind::Campaign, "Nebula Protocol");
        assert!(body.contains("Nebula Protocol"));
    }
}
