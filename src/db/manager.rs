use crate::config::{DatabaseConfig, DbType as ConfigDbType};
use crate::db::{DatabaseError, MessageStore, NotificationStore, ProjectStore, RoomStore};
use std::sync::Arc;

#[cfg(feature = "postgres")]
use crate::db::postgres::{
    PgPool, PostgresMessageStore, PostgresNotificationStore, PostgresProjectStore,
    PostgresRoomStore,
};
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};
#[cfg(feature = "postgres")]
use diesel::RunQueryDsl;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{
    SqliteMessageStore, SqliteNotificationStore, SqliteProjectStore, SqliteRoomStore,
};
#[cfg(feature = "sqlite")]
use diesel::sqlite::SqliteConnection;
#[cfg(feature = "sqlite")]
use diesel::Connection;
#[cfg(feature = "sqlite")]
use diesel::RunQueryDsl as _;

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<PgPool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    room_store: Arc<dyn RoomStore>,
    message_store: Arc<dyn MessageStore>,
    notification_store: Arc<dyn NotificationStore>,
    project_store: Arc<dyn ProjectStore>,
    db_type: DbType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl From<ConfigDbType> for DbType {
    fn from(value: ConfigDbType) -> Self {
        match value {
            ConfigDbType::Postgres => DbType::Postgres,
            ConfigDbType::Sqlite => DbType::Sqlite,
        }
    }
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = DbType::from(config.db_type());

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = builder
                    .build(manager)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                let room_store = Arc::new(PostgresRoomStore::new(pool.clone()));
                let message_store = Arc::new(PostgresMessageStore::new(pool.clone()));
                let notification_store = Arc::new(PostgresNotificationStore::new(pool.clone()));
                let project_store = Arc::new(PostgresProjectStore::new(pool.clone()));

                Ok(Self {
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    room_store,
                    message_store,
                    notification_store,
                    project_store,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config
                    .sqlite_path()
                    .ok_or_else(|| DatabaseError::Connection("missing sqlite path".to_string()))?;
                let path_arc = Arc::new(path.clone());

                let room_store = Arc::new(SqliteRoomStore::new(path_arc.clone()));
                let message_store = Arc::new(SqliteMessageStore::new(path_arc.clone()));
                let notification_store = Arc::new(SqliteNotificationStore::new(path_arc.clone()));
                let project_store = Arc::new(SqliteProjectStore::new(path_arc));

                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    sqlite_path: Some(path),
                    room_store,
                    message_store,
                    notification_store,
                    project_store,
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool not initialized".to_string())
                })?;
                Self::migrate_postgres(pool).await
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.as_ref().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path not initialized".to_string())
                })?;
                Self::migrate_sqlite(path).await
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    #[cfg(feature = "postgres")]
    async fn migrate_postgres(pool: &PgPool) -> Result<(), DatabaseError> {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS rooms (
                    id BIGSERIAL PRIMARY KEY,
                    room_id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    owner_id TEXT NOT NULL,
                    members TEXT NOT NULL,
                    roles TEXT NOT NULL,
                    is_private BOOLEAN NOT NULL DEFAULT TRUE,
                    allow_files BOOLEAN NOT NULL DEFAULT TRUE,
                    allow_calls BOOLEAN NOT NULL DEFAULT FALSE,
                    allow_reactions BOOLEAN NOT NULL DEFAULT TRUE,
                    status TEXT NOT NULL DEFAULT 'active',
                    project_id TEXT,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    last_activity_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS messages (
                    id BIGSERIAL PRIMARY KEY,
                    message_id TEXT NOT NULL UNIQUE,
                    room_id TEXT NOT NULL,
                    sender_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    body TEXT,
                    attachments TEXT NOT NULL DEFAULT '[]',
                    reply_to TEXT,
                    reactions TEXT NOT NULL DEFAULT '{}',
                    read_by TEXT NOT NULL DEFAULT '[]',
                    pinned BOOLEAN NOT NULL DEFAULT FALSE,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                    edited_at TIMESTAMP WITH TIME ZONE,
                    deleted_at TIMESTAMP WITH TIME ZONE
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS notifications (
                    id BIGSERIAL PRIMARY KEY,
                    notification_id TEXT NOT NULL UNIQUE,
                    user_id TEXT NOT NULL,
                    source TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL,
                    read BOOLEAN NOT NULL DEFAULT FALSE,
                    priority TEXT NOT NULL DEFAULT 'normal',
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS projects (
                    id BIGSERIAL PRIMARY KEY,
                    project_id TEXT NOT NULL UNIQUE,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    token_symbol TEXT NOT NULL,
                    sector TEXT NOT NULL,
                    stage TEXT NOT NULL,
                    description TEXT NOT NULL,
                    website TEXT,
                    whitepaper_url TEXT,
                    audited BOOLEAN NOT NULL DEFAULT FALSE,
                    kyc_verified BOOLEAN NOT NULL DEFAULT FALSE,
                    team_public BOOLEAN NOT NULL DEFAULT FALSE,
                    target_raise_usd BIGINT NOT NULL DEFAULT 0,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_rooms_room_id ON rooms(room_id)",
                "CREATE INDEX IF NOT EXISTS idx_rooms_status_activity ON rooms(status, last_activity_at)",
                "CREATE INDEX IF NOT EXISTS idx_messages_room_created ON messages(room_id, created_at)",
                "CREATE INDEX IF NOT EXISTS idx_messages_message_id ON messages(message_id)",
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_created ON notifications(user_id, created_at)",
                "CREATE INDEX IF NOT EXISTS idx_projects_project_id ON projects(project_id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(path: &str) -> Result<(), DatabaseError> {
        let path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = SqliteConnection::establish(&path)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS rooms (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    room_id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    owner_id TEXT NOT NULL,
                    members TEXT NOT NULL,
                    roles TEXT NOT NULL,
                    is_private BOOLEAN NOT NULL DEFAULT 1,
                    allow_files BOOLEAN NOT NULL DEFAULT 1,
                    allow_calls BOOLEAN NOT NULL DEFAULT 0,
                    allow_reactions BOOLEAN NOT NULL DEFAULT 1,
                    status TEXT NOT NULL DEFAULT 'active',
                    project_id TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    last_activity_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    message_id TEXT NOT NULL UNIQUE,
                    room_id TEXT NOT NULL,
                    sender_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    body TEXT,
                    attachments TEXT NOT NULL DEFAULT '[]',
                    reply_to TEXT,
                    reactions TEXT NOT NULL DEFAULT '{}',
                    read_by TEXT NOT NULL DEFAULT '[]',
                    pinned BOOLEAN NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    edited_at TEXT,
                    deleted_at TEXT
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS notifications (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    notification_id TEXT NOT NULL UNIQUE,
                    user_id TEXT NOT NULL,
                    source TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL,
                    read BOOLEAN NOT NULL DEFAULT 0,
                    priority TEXT NOT NULL DEFAULT 'normal',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS projects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id TEXT NOT NULL UNIQUE,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    token_symbol TEXT NOT NULL,
                    sector TEXT NOT NULL,
                    stage TEXT NOT NULL,
                    description TEXT NOT NULL,
                    website TEXT,
                    whitepaper_url TEXT,
                    audited BOOLEAN NOT NULL DEFAULT 0,
                    kyc_verified BOOLEAN NOT NULL DEFAULT 0,
                    team_public BOOLEAN NOT NULL DEFAULT 0,
                    target_raise_usd BIGINT NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_rooms_room_id ON rooms(room_id)",
                "CREATE INDEX IF NOT EXISTS idx_rooms_status_activity ON rooms(status, last_activity_at)",
                "CREATE INDEX IF NOT EXISTS idx_messages_room_created ON messages(room_id, created_at)",
                "CREATE INDEX IF NOT EXISTS idx_messages_message_id ON messages(message_id)",
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_created ON notifications(user_id, created_at)",
                "CREATE INDEX IF NOT EXISTS idx_projects_project_id ON projects(project_id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn room_store(&self) -> Arc<dyn RoomStore> {
        self.room_store.clone()
    }

    pub fn message_store(&self) -> Arc<dyn MessageStore> {
        self.message_store.clone()
    }

    pub fn notification_store(&self) -> Arc<dyn NotificationStore> {
        self.notification_store.clone()
    }

    pub fn project_store(&self) -> Arc<dyn ProjectStore> {
        self.project_store.clone()
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::{
        Message, MessageKind, Notification, NotificationPriority, Room, RoomKind, RoomStatus,
    };

    fn test_config() -> (NamedTempFile, DatabaseConfig) {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = DatabaseConfig {
            url: None,
            filename: Some(file.path().to_string_lossy().to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        };
        (file, config)
    }

    fn sample_room(room_id: &str) -> Room {
        let mut roles = BTreeMap::new();
        roles.insert("founder-1".to_string(), "founder".to_string());
        roles.insert("agency-1".to_string(), "agency".to_string());
        Room {
            id: 0,
            room_id: room_id.to_string(),
            name: "Nebula x StellarPR".to_string(),
            kind: RoomKind::Deal,
            owner_id: "founder-1".to_string(),
            members: vec!["founder-1".to_string(), "agency-1".to_string()],
            roles,
            is_private: true,
            allow_files: true,
            allow_calls: false,
            allow_reactions: true,
            status: RoomStatus::Active,
            project_id: Some("project-1".to_string()),
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
        }
    }

    fn sample_message(room_id: &str, message_id: &str, body: &str) -> Message {
        Message {
            id: 0,
            message_id: message_id.to_string(),
            room_id: room_id.to_string(),
            sender_id: "founder-1".to_string(),
            kind: MessageKind::Text,
            body: Some(body.to_string()),
            attachments: Vec::new(),
            reply_to: None,
            reactions: BTreeMap::new(),
            read_by: vec!["founder-1".to_string()],
            pinned: false,
            created_at: Utc::now(),
            edited_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn room_creation_is_idempotent_by_room_id() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let room = sample_room("room-abc");
        let first = manager
            .room_store()
            .create_room_if_absent(&room)
            .await
            .expect("first insert");
        let second = manager
            .room_store()
            .create_room_if_absent(&room)
            .await
            .expect("second insert");

        assert!(first);
        assert!(!second);
        assert_eq!(manager.room_store().count_rooms().await.expect("count"), 1);

        let stored = manager
            .room_store()
            .get_room("room-abc")
            .await
            .expect("get")
            .expect("room exists");
        assert_eq!(stored.owner_id, "founder-1");
        assert!(stored.has_member("agency-1"));
    }

    #[tokio::test]
    async fn user_rooms_are_ordered_by_last_activity() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let mut older = sample_room("room-old");
        older.last_activity_at = Utc::now() - Duration::hours(2);
        let newer = sample_room("room-new");

        manager
            .room_store()
            .create_room_if_absent(&older)
            .await
            .expect("insert older");
        manager
            .room_store()
            .create_room_if_absent(&newer)
            .await
            .expect("insert newer");

        let rooms = manager
            .room_store()
            .get_user_rooms("founder-1")
            .await
            .expect("user rooms");
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].room_id, "room-new");
        assert_eq!(rooms[1].room_id, "room-old");

        // Non-members see nothing even if their id is a substring of a member id.
        let rooms = manager
            .room_store()
            .get_user_rooms("founder")
            .await
            .expect("user rooms");
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn closed_rooms_are_excluded_from_user_rooms() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let room = sample_room("room-closing");
        manager
            .room_store()
            .create_room_if_absent(&room)
            .await
            .expect("insert");
        manager
            .room_store()
            .update_status("room-closing", RoomStatus::Closed)
            .await
            .expect("close");

        let rooms = manager
            .room_store()
            .get_user_rooms("founder-1")
            .await
            .expect("user rooms");
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn soft_deleted_messages_are_invisible() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let room = sample_room("room-msgs");
        manager
            .room_store()
            .create_room_if_absent(&room)
            .await
            .expect("insert room");

        let keep = sample_message("room-msgs", "msg-1", "hello");
        let mut gone = sample_message("room-msgs", "msg-2", "mistake");
        manager
            .message_store()
            .append_message(&keep)
            .await
            .expect("append keep");
        manager
            .message_store()
            .append_message(&gone)
            .await
            .expect("append gone");

        gone.deleted_at = Some(Utc::now());
        manager
            .message_store()
            .update_message(&gone)
            .await
            .expect("soft delete");

        let visible = manager
            .message_store()
            .list_visible("room-msgs", 50)
            .await
            .expect("list");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message_id, "msg-1");
        assert_eq!(
            manager
                .message_store()
                .count_visible("room-msgs")
                .await
                .expect("count"),
            1
        );

        // The row itself is retained and still addressable.
        let raw = manager
            .message_store()
            .get_message("room-msgs", "msg-2")
            .await
            .expect("get")
            .expect("row kept");
        assert!(raw.is_deleted());
    }

    #[tokio::test]
    async fn reaction_updates_round_trip() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let mut message = sample_message("room-react", "msg-react", "hello");
        manager
            .message_store()
            .append_message(&message)
            .await
            .expect("append");

        message
            .reactions
            .insert("👍".to_string(), vec!["u1".to_string()]);
        manager
            .message_store()
            .update_message(&message)
            .await
            .expect("update");

        let stored = manager
            .message_store()
            .get_message("room-react", "msg-react")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(stored.reactions.get("👍"), Some(&vec!["u1".to_string()]));
    }

    #[tokio::test]
    async fn notification_mark_read_checks_ownership() {
        let (_file, config) = test_config();
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let notification = Notification {
            id: 0,
            notification_id: "ntf-1".to_string(),
            user_id: "founder-1".to_string(),
            source: "deal_room".to_string(),
            title: "New deal room".to_string(),
            body: "StellarPR accepted your pitch".to_string(),
            read: false,
            priority: NotificationPriority::Normal,
            created_at: Utc::now(),
        };
        manager
            .notification_store()
            .create_notification(&notification)
            .await
            .expect("create");

        assert!(!manager
            .notification_store()
            .mark_read("ntf-1", "someone-else")
            .await
            .expect("mark as other"));
        assert!(manager
            .notification_store()
            .mark_read("ntf-1", "founder-1")
            .await
            .expect("mark as owner"));

        let listed = manager
            .notification_store()
            .list_for_user("founder-1", 10)
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert!(listed[0].read);
    }
}
