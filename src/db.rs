use std::ops::Bound;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    FromRow,
};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    id::{RoomId, UserId},
    rooms::{Message, MessageRange, Room, Yaml},
    setting::Settings,
    store::Store,
    users::User,
    AppResult,
};

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    nickname TEXT,
    owner_id TEXT,
    owner_name TEXT,
    is_public BOOLEAN NOT NULL DEFAULT 1,
    deleted BOOLEAN NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    yaml TEXT NOT NULL DEFAULT '{}'
);

-- unique: nickname among live rooms
CREATE UNIQUE INDEX IF NOT EXISTS idx_rooms_live_nickname
    ON rooms(nickname) WHERE deleted = 0 AND nickname IS NOT NULL;

CREATE TABLE IF NOT EXISTS room_members (
    room_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (room_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    room_id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_room_id ON messages(room_id, id);
"#;

const ROOM_COLUMNS: &str =
    "id,title,nickname,owner_id,owner_name,is_public,deleted,updated_at,yaml";

#[derive(FromRow)]
struct RoomRow {
    id: String,
    title: String,
    nickname: Option<String>,
    owner_id: Option<String>,
    owner_name: Option<String>,
    is_public: bool,
    deleted: bool,
    updated_at: OffsetDateTime,
    yaml: String,
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    room_id: String,
    body: String,
    created_at: OffsetDateTime,
}

impl MessageRow {
    fn into_message(self) -> AppResult<Message> {
        Ok(Message {
            id: self.id.parse()?,
            room_id: self.room_id.parse()?,
            body: self.body,
            created_at: self.created_at,
        })
    }
}

/// Rooms, users and messages in SQLite. Ids are stored in their hyphenated
/// string form, which sorts the same way the ids do.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(settings: &Settings) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.database_url)
            .await?;
        info!(url = %settings.database_url, "connected to database");

        Self::with_pool(pool).await
    }

    /// A private database that lives as long as the store does.
    pub async fn in_memory() -> AppResult<Self> {
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> AppResult<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::raw_sql(MIGRATIONS).execute(&self.pool).await?;
        debug!("migrations applied");
        Ok(())
    }

    async fn load_room(&self, row: RoomRow) -> AppResult<Room> {
        let members: Vec<(String, String)> = sqlx::query_as(
            "SELECT u.id,u.name FROM room_members m JOIN users u ON u.id=m.user_id \
             WHERE m.room_id=? ORDER BY m.position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let members = members
            .into_iter()
            .map(|(id, name)| -> AppResult<User> { Ok(User { id: id.parse()?, name }) })
            .collect::<AppResult<Vec<_>>>()?;

        let user = match (row.owner_id, row.owner_name) {
            (Some(id), name) => Some(User {
                id: id.parse()?,
                name: name.unwrap_or_default(),
            }),
            (None, _) => None,
        };

        let yaml: Yaml = serde_yaml::from_str(&row.yaml)?;

        Ok(Room {
            id: row.id.parse()?,
            title: row.title,
            nickname: row.nickname,
            user,
            is_public: row.is_public,
            members,
            deleted: row.deleted,
            updated_at: row.updated_at,
            yaml,
        })
    }

    async fn load_rooms(&self, rows: Vec<RoomRow>) -> AppResult<Vec<Room>> {
        let mut rooms = Vec::with_capacity(rows.len());
        for row in rows {
            rooms.push(self.load_room(row).await?);
        }
        Ok(rooms)
    }

    async fn write_members(conn: &mut sqlx::SqliteConnection, room: &Room) -> AppResult<()> {
        for (position, member) in room.members.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO room_members (room_id,user_id,position) VALUES (?,?,?)",
            )
            .bind(room.id.to_string())
            .bind(member.id.to_string())
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query("INSERT INTO users (id,name) VALUES (?,?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>> {
        let row: Option<(String, String)> = sqlx::query_as("SELECT id,name FROM users WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((id, name)) => Ok(Some(User { id: id.parse()?, name })),
            None => Ok(None),
        }
    }

    async fn insert_room(&self, room: &Room) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO rooms (id,title,nickname,owner_id,owner_name,is_public,deleted,updated_at,yaml) \
             VALUES (?,?,?,?,?,?,?,?,?)",
        )
        .bind(room.id.to_string())
        .bind(&room.title)
        .bind(&room.nickname)
        .bind(room.user.as_ref().map(|user| user.id.to_string()))
        .bind(room.user.as_ref().map(|user| user.name.clone()))
        .bind(room.is_public)
        .bind(room.deleted)
        .bind(room.updated_at)
        .bind(serde_yaml::to_string(&room.yaml)?)
        .execute(&mut *tx)
        .await?;

        Self::write_members(&mut *tx, room).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_room(&self, room: &Room) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE rooms SET title=?,nickname=?,owner_id=?,owner_name=?,is_public=?,deleted=?,updated_at=?,yaml=? \
             WHERE id=?",
        )
        .bind(&room.title)
        .bind(&room.nickname)
        .bind(room.user.as_ref().map(|user| user.id.to_string()))
        .bind(room.user.as_ref().map(|user| user.name.clone()))
        .bind(room.is_public)
        .bind(room.deleted)
        .bind(room.updated_at)
        .bind(serde_yaml::to_string(&room.yaml)?)
        .bind(room.id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("room {} does not exist", room.id).into());
        }

        Self::write_members(&mut *tx, room).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_room_by_id(&self, id: &RoomId) -> AppResult<Option<Room>> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id=?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.load_room(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_room_by_nickname(&self, nickname: &str) -> AppResult<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE nickname=? AND deleted=0"
        ))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_room(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_non_deleted_rooms(&self) -> AppResult<Vec<Room>> {
        let rows: Vec<RoomRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE deleted=0 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.load_rooms(rows).await
    }

    async fn nickname_taken(&self, nickname: &str, except: Option<&RoomId>) -> AppResult<bool> {
        let taken: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM rooms WHERE nickname=? AND deleted=0 AND id IS NOT ?",
        )
        .bind(nickname)
        .bind(except.map(RoomId::to_string))
        .fetch_optional(&self.pool)
        .await?;

        Ok(taken.is_some())
    }

    async fn insert_message(&self, message: &Message) -> AppResult<()> {
        sqlx::query("INSERT INTO messages (id,room_id,body,created_at) VALUES (?,?,?,?)")
            .bind(message.id.to_string())
            .bind(message.room_id.to_string())
            .bind(&message.body)
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_messages(
        &self,
        room_id: &RoomId,
        range: &MessageRange,
        limit: usize,
    ) -> AppResult<Vec<Message>> {
        let mut sql = String::from("SELECT id,room_id,body,created_at FROM messages WHERE room_id=?");
        let mut bounds = Vec::with_capacity(2);

        match range.lower {
            Bound::Included(id) => {
                sql += " AND id>=?";
                bounds.push(id.to_string());
            }
            Bound::Excluded(id) => {
                sql += " AND id>?";
                bounds.push(id.to_string());
            }
            Bound::Unbounded => {}
        }
        match range.upper {
            Bound::Included(id) => {
                sql += " AND id<=?";
                bounds.push(id.to_string());
            }
            Bound::Excluded(id) => {
                sql += " AND id<?";
                bounds.push(id.to_string());
            }
            Bound::Unbounded => {}
        }
        sql += if range.ascending { " ORDER BY id ASC" } else { " ORDER BY id DESC" };
        sql += " LIMIT ?";

        let mut query = sqlx::query_as::<_, MessageRow>(&sql).bind(room_id.to_string());
        for bound in bounds {
            query = query.bind(bound);
        }
        let rows = query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
