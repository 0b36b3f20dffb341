pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{
    Message, MessageKind, Notification, NotificationPriority, Project, Room, RoomKind, RoomStatus,
};
pub use self::stores::{MessageStore, NotificationStore, ProjectStore, RoomStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod stores;

#[cfg(feature = "postgres")]
pub mod schema;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub mod schema_sqlite;
