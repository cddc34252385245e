//! Persistence seam for rooms, users and messages.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::{
    id::{RoomId, UserId},
    rooms::{Message, MessageRange, Room},
    users::User,
    AppResult,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> AppResult<()>;
    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>>;

    async fn insert_room(&self, room: &Room) -> AppResult<()>;
    /// Overwrites every field of the stored room with `id == room.id`.
    async fn update_room(&self, room: &Room) -> AppResult<()>;
    /// Deleted rooms included.
    async fn find_room_by_id(&self, id: &RoomId) -> AppResult<Option<Room>>;
    /// Live rooms only.
    async fn find_room_by_nickname(&self, nickname: &str) -> AppResult<Option<Room>>;
    async fn list_non_deleted_rooms(&self) -> AppResult<Vec<Room>>;
    /// Whether a live room other than `except` holds `nickname`.
    async fn nickname_taken(&self, nickname: &str, except: Option<&RoomId>) -> AppResult<bool>;

    async fn insert_message(&self, message: &Message) -> AppResult<()>;
    /// At most `limit` messages of the room inside `range`, in the
    /// range's walking order.
    async fn query_messages(
        &self,
        room_id: &RoomId,
        range: &MessageRange,
        limit: usize,
    ) -> AppResult<Vec<Message>>;
}
