use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{Message, Notification, Project, Room, RoomStatus};
use super::DatabaseError;

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, DatabaseError>;
    /// Active rooms containing the user, most recently active first.
    async fn get_user_rooms(&self, user_id: &str) -> Result<Vec<Room>, DatabaseError>;
    /// Insert unless a room with the same public id exists. Returns whether
    /// this call actually inserted the row, which is what makes racing
    /// accept-pitch requests agree on a single creator.
    async fn create_room_if_absent(&self, room: &Room) -> Result<bool, DatabaseError>;
    async fn update_status(
        &self,
        room_id: &str,
        status: RoomStatus,
    ) -> Result<(), DatabaseError>;
    async fn touch(&self, room_id: &str, at: DateTime<Utc>) -> Result<(), DatabaseError>;
    async fn count_rooms(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append_message(&self, message: &Message) -> Result<(), DatabaseError>;
    async fn get_message(
        &self,
        room_id: &str,
        message_id: &str,
    ) -> Result<Option<Message>, DatabaseError>;
    /// The newest `limit` non-deleted messages, newest first. Callers reverse
    /// for display.
    async fn list_visible(&self, room_id: &str, limit: i64)
        -> Result<Vec<Message>, DatabaseError>;
    /// Full-row update; reaction toggles and read receipts are
    /// read-modify-write at the caller, last write wins.
    async fn update_message(&self, message: &Message) -> Result<(), DatabaseError>;
    async fn count_visible(&self, room_id: &str) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: &Notification)
        -> Result<(), DatabaseError>;
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Notification>, DatabaseError>;
    /// Returns false when the notification does not exist or belongs to
    /// someone else.
    async fn mark_read(&self, notification_id: &str, user_id: &str)
        -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, DatabaseError>;
    async fn create_project_if_absent(&self, project: &Project) -> Result<bool, DatabaseError>;
    async fn list_projects(&self, limit: i64, offset: i64) -> Result<Vec<Project>, DatabaseError>;
}
