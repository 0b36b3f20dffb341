use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::db::schema::{messages, notifications, projects, rooms};

use super::models::{self, Message, Notification, Project, Room, RoomStatus};
use super::DatabaseError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

fn get_conn(
    pool: &PgPool,
) -> Result<diesel::r2d2::PooledConnection<ConnectionManager<PgConnection>>, DatabaseError> {
    pool.get().map_err(|e| DatabaseError::Connection(e.to_string()))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rooms)]
struct DbRoom {
    id: i64,
    room_id: String,
    name: String,
    kind: String,
    owner_id: String,
    members: String,
    roles: String,
    is_private: bool,
    allow_files: bool,
    allow_calls: bool,
    allow_reactions: bool,
    status: String,
    project_id: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl DbRoom {
    fn to_room(&self) -> Result<Room, DatabaseError> {
        Ok(Room {
            id: self.id,
            room_id: self.room_id.clone(),
            name: self.name.clone(),
            kind: models::parse_room_kind(&self.kind)?,
            owner_id: self.owner_id.clone(),
            members: models::parse_string_vec(&self.members)?,
            roles: models::parse_string_map(&self.roles)?,
            is_private: self.is_private,
            allow_files: self.allow_files,
            allow_calls: self.allow_calls,
            allow_reactions: self.allow_reactions,
            status: models::parse_room_status(&self.status)?,
            project_id: self.project_id.clone(),
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = rooms)]
struct NewRoom<'a> {
    room_id: &'a str,
    name: &'a str,
    kind: &'a str,
    owner_id: &'a str,
    members: String,
    roles: String,
    is_private: bool,
    allow_files: bool,
    allow_calls: bool,
    allow_reactions: bool,
    status: &'a str,
    project_id: Option<&'a str>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
struct DbMessage {
    id: i64,
    message_id: String,
    room_id: String,
    sender_id: String,
    kind: String,
    body: Option<String>,
    attachments: String,
    reply_to: Option<String>,
    reactions: String,
    read_by: String,
    pinned: bool,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl DbMessage {
    fn to_message(&self) -> Result<Message, DatabaseError> {
        Ok(Message {
            id: self.id,
            message_id: self.message_id.clone(),
            room_id: self.room_id.clone(),
            sender_id: self.sender_id.clone(),
            kind: models::parse_message_kind(&self.kind)?,
            body: self.body.clone(),
            attachments: models::parse_string_vec(&self.attachments)?,
            reply_to: self.reply_to.clone(),
            reactions: models::parse_reactions(&self.reactions)?,
            read_by: models::parse_string_vec(&self.read_by)?,
            pinned: self.pinned,
            created_at: self.created_at,
            edited_at: self.edited_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = messages)]
struct NewMessage<'a> {
    message_id: &'a str,
    room_id: &'a str,
    sender_id: &'a str,
    kind: &'a str,
    body: Option<&'a str>,
    attachments: String,
    reply_to: Option<&'a str>,
    reactions: String,
    read_by: String,
    pinned: bool,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = messages)]
#[diesel(treat_none_as_null = true)]
struct UpdateMessage<'a> {
    body: Option<&'a str>,
    reactions: String,
    read_by: String,
    pinned: bool,
    edited_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
struct DbNotification {
    id: i64,
    notification_id: String,
    user_id: String,
    source: String,
    title: String,
    body: String,
    read: bool,
    priority: String,
    created_at: DateTime<Utc>,
}

impl DbNotification {
    fn to_notification(&self) -> Result<Notification, DatabaseError> {
        Ok(Notification {
            id: self.id,
            notification_id: self.notification_id.clone(),
            user_id: self.user_id.clone(),
            source: self.source.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            read: self.read,
            priority: models::parse_priority(&self.priority)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = notifications)]
struct NewNotification<'a> {
    notification_id: &'a str,
    user_id: &'a str,
    source: &'a str,
    title: &'a str,
    body: &'a str,
    read: bool,
    priority: &'a str,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
struct DbProject {
    id: i64,
    project_id: String,
    owner_id: String,
    name: String,
    token_symbol: String,
    sector: String,
    stage: String,
    description: String,
    website: Option<String>,
    whitepaper_url: Option<String>,
    audited: bool,
    kyc_verified: bool,
    team_public: bool,
    target_raise_usd: i64,
    created_at: DateTime<Utc>,
}

impl DbProject {
    fn to_project(&self) -> Result<Project, DatabaseError> {
        Ok(Project {
            id: self.id,
            project_id: self.project_id.clone(),
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            token_symbol: self.token_symbol.clone(),
            sector: self.sector.clone(),
            stage: self.stage.clone(),
            description: self.description.clone(),
            website: self.website.clone(),
            whitepaper_url: self.whitepaper_url.clone(),
            audited: self.audited,
            kyc_verified: self.kyc_verified,
            team_public: self.team_public,
            target_raise_usd: self.target_raise_usd,
            created_at: self.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = projects)]
struct NewProject<'a> {
    project_id: &'a str,
    owner_id: &'a str,
    name: &'a str,
    token_symbol: &'a str,
    sector: &'a str,
    stage: &'a str,
    description: &'a str,
    website: Option<&'a str>,
    whitepaper_url: Option<&'a str>,
    audited: bool,
    kyc_verified: bool,
    team_public: bool,
    target_raise_usd: i64,
    created_at: DateTime<Utc>,
}

pub struct PostgresRoomStore {
    pool: PgPool,
}

impl PostgresRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::RoomStore for PostgresRoomStore {
    async fn get_room(&self, room: &str) -> Result<Option<Room>, DatabaseError> {
        let room = room.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::rooms::dsl::*;
            rooms
                .filter(room_id.eq(room))
                .select(DbRoom::as_select())
                .first::<DbRoom>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|r| r.to_room())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn get_user_rooms(&self, user: &str) -> Result<Vec<Room>, DatabaseError> {
        let user = user.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::rooms::dsl::*;
            let pattern = format!("%\"{}\"%", user.replace('%', "").replace('_', ""));
            let rows = rooms
                .filter(status.eq(RoomStatus::Active.as_str()))
                .filter(members.like(pattern))
                .order(last_activity_at.desc())
                .select(DbRoom::as_select())
                .load::<DbRoom>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            let mut result = Vec::with_capacity(rows.len());
            for row in rows {
                let parsed = row.to_room()?;
                if parsed.has_member(&user) {
                    result.push(parsed);
                }
            }
            Ok(result)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_room_if_absent(&self, room: &Room) -> Result<bool, DatabaseError> {
        let room = room.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let new_room = NewRoom {
                room_id: &room.room_id,
                name: &room.name,
                kind: room.kind.as_str(),
                owner_id: &room.owner_id,
                members: models::encode_string_vec(&room.members)?,
                roles: models::encode_string_map(&room.roles)?,
                is_private: room.is_private,
                allow_files: room.allow_files,
                allow_calls: room.allow_calls,
                allow_reactions: room.allow_reactions,
                status: room.status.as_str(),
                project_id: room.project_id.as_deref(),
                created_at: room.created_at,
                last_activity_at: room.last_activity_at,
            };
            use crate::db::schema::rooms::dsl::*;
            let inserted = diesel::insert_into(rooms)
                .values(&new_room)
                .on_conflict(room_id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(inserted > 0)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn update_status(
        &self,
        room: &str,
        new_status: RoomStatus,
    ) -> Result<(), DatabaseError> {
        let room = room.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::rooms::dsl::*;
            diesel::update(rooms.filter(room_id.eq(room)))
                .set(status.eq(new_status.as_str()))
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn touch(&self, room: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let room = room.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::rooms::dsl::*;
            diesel::update(rooms.filter(room_id.eq(room)))
                .set(last_activity_at.eq(at))
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn count_rooms(&self) -> Result<i64, DatabaseError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::rooms::dsl::*;
            rooms
                .count()
                .get_result::<i64>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::MessageStore for PostgresMessageStore {
    async fn append_message(&self, message: &Message) -> Result<(), DatabaseError> {
        let message = message.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let new_message = NewMessage {
                message_id: &message.message_id,
                room_id: &message.room_id,
                sender_id: &message.sender_id,
                kind: message.kind.as_str(),
                body: message.body.as_deref(),
                attachments: models::encode_string_vec(&message.attachments)?,
                reply_to: message.reply_to.as_deref(),
                reactions: models::encode_reactions(&message.reactions)?,
                read_by: models::encode_string_vec(&message.read_by)?,
                pinned: message.pinned,
                created_at: message.created_at,
                edited_at: message.edited_at,
                deleted_at: message.deleted_at,
            };
            use crate::db::schema::messages::dsl::*;
            diesel::insert_into(messages)
                .values(&new_message)
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn get_message(
        &self,
        room: &str,
        message: &str,
    ) -> Result<Option<Message>, DatabaseError> {
        let room = room.to_string();
        let message = message.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::messages::dsl::*;
            messages
                .filter(room_id.eq(room))
                .filter(message_id.eq(message))
                .select(DbMessage::as_select())
                .first::<DbMessage>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|m| m.to_message())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn list_visible(
        &self,
        room: &str,
        limit: i64,
    ) -> Result<Vec<Message>, DatabaseError> {
        let room = room.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::messages::dsl::*;
            messages
                .filter(room_id.eq(room))
                .filter(deleted_at.is_null())
                .order(created_at.desc())
                .limit(limit)
                .select(DbMessage::as_select())
                .load::<DbMessage>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .iter()
                .map(|m| m.to_message())
                .collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn update_message(&self, message: &Message) -> Result<(), DatabaseError> {
        let message = message.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let changes = UpdateMessage {
                body: message.body.as_deref(),
                reactions: models::encode_reactions(&message.reactions)?,
                read_by: models::encode_string_vec(&message.read_by)?,
                pinned: message.pinned,
                edited_at: message.edited_at,
                deleted_at: message.deleted_at,
            };
            use crate::db::schema::messages::dsl::*;
            diesel::update(
                messages
                    .filter(room_id.eq(&message.room_id))
                    .filter(message_id.eq(&message.message_id)),
            )
            .set(&changes)
            .execute(&mut conn)
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn count_visible(&self, room: &str) -> Result<i64, DatabaseError> {
        let room = room.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::messages::dsl::*;
            messages
                .filter(room_id.eq(room))
                .filter(deleted_at.is_null())
                .count()
                .get_result::<i64>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct PostgresNotificationStore {
    pool: PgPool,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::NotificationStore for PostgresNotificationStore {
    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<(), DatabaseError> {
        let notification = notification.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let new_notification = NewNotification {
                notification_id: &notification.notification_id,
                user_id: &notification.user_id,
                source: &notification.source,
                title: &notification.title,
                body: &notification.body,
                read: notification.read,
                priority: notification.priority.as_str(),
                created_at: notification.created_at,
            };
            use crate::db::schema::notifications::dsl::*;
            diesel::insert_into(notifications)
                .values(&new_notification)
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn list_for_user(
        &self,
        user: &str,
        limit: i64,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let user = user.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::notifications::dsl::*;
            notifications
                .filter(user_id.eq(user))
                .order(created_at.desc())
                .limit(limit)
                .select(DbNotification::as_select())
                .load::<DbNotification>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .iter()
                .map(|n| n.to_notification())
                .collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn mark_read(&self, notification: &str, user: &str) -> Result<bool, DatabaseError> {
        let notification = notification.to_string();
        let user = user.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::notifications::dsl::*;
            let updated = diesel::update(
                notifications
                    .filter(notification_id.eq(notification))
                    .filter(user_id.eq(user)),
            )
            .set(read.eq(true))
            .execute(&mut conn)
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(updated > 0)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct PostgresProjectStore {
    pool: PgPool,
}

impl PostgresProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::ProjectStore for PostgresProjectStore {
    async fn get_project(&self, project: &str) -> Result<Option<Project>, DatabaseError> {
        let project = project.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::projects::dsl::*;
            projects
                .filter(project_id.eq(project))
                .select(DbProject::as_select())
                .first::<DbProject>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|p| p.to_project())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn create_project_if_absent(&self, project: &Project) -> Result<bool, DatabaseError> {
        let project = project.clone();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let new_project = NewProject {
                project_id: &project.project_id,
                owner_id: &project.owner_id,
                name: &project.name,
                token_symbol: &project.token_symbol,
                sector: &project.sector,
                stage: &project.stage,
                description: &project.description,
                website: project.website.as_deref(),
                whitepaper_url: project.whitepaper_url.as_deref(),
                audited: project.audited,
                kyc_verified: project.kyc_verified,
                team_public: project.team_public,
                target_raise_usd: project.target_raise_usd,
                created_at: project.created_at,
            };
            use crate::db::schema::projects::dsl::*;
            let inserted = diesel::insert_into(projects)
                .values(&new_project)
                .on_conflict(project_id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;
            Ok(inserted > 0)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn list_projects(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, DatabaseError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            use crate::db::schema::projects::dsl::*;
            projects
                .order(created_at.desc())
                .limit(limit)
                .offset(offset)
                .select(DbProject::as_select())
                .load::<DbProject>(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .iter()
                .map(|p| p.to_project())
                .collect()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
