use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    id::{MessageId, RoomId, UserId},
    rooms::{Message, MessageRange, Room},
    users::User,
    AppResult,
};

use super::Store;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    rooms: HashMap<RoomId, Room>,
    messages: HashMap<RoomId, BTreeMap<MessageId, Message>>,
}

impl State {
    fn nickname_taken(&self, nickname: &str, except: Option<&RoomId>) -> bool {
        self.rooms.values().any(|room| {
            !room.deleted
                && Some(&room.id) != except
                && room.nickname.as_deref() == Some(nickname)
        })
    }

    fn check_nickname(&self, room: &Room) -> AppResult<()> {
        match &room.nickname {
            Some(nickname) if !room.deleted && self.nickname_taken(nickname, Some(&room.id)) => {
                Err(anyhow!("nickname {nickname} already taken").into())
            }
            _ => Ok(()),
        }
    }
}

/// Everything in process memory. Gone on drop.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.write();
        if state.users.contains_key(&user.id) {
            return Err(anyhow!("user {} already exists", user.id).into());
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().users.get(id).cloned())
    }

    async fn insert_room(&self, room: &Room) -> AppResult<()> {
        let mut state = self.state.write();
        if state.rooms.contains_key(&room.id) {
            return Err(anyhow!("room {} already exists", room.id).into());
        }
        state.check_nickname(room)?;
        state.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn update_room(&self, room: &Room) -> AppResult<()> {
        let mut state = self.state.write();
        if !state.rooms.contains_key(&room.id) {
            return Err(anyhow!("room {} does not exist", room.id).into());
        }
        state.check_nickname(room)?;
        state.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn find_room_by_id(&self, id: &RoomId) -> AppResult<Option<Room>> {
        Ok(self.state.read().rooms.get(id).cloned())
    }

    async fn find_room_by_nickname(&self, nickname: &str) -> AppResult<Option<Room>> {
        Ok(self
            .state
            .read()
            .rooms
            .values()
            .find(|room| !room.deleted && room.nickname.as_deref() == Some(nickname))
            .cloned())
    }

    async fn list_non_deleted_rooms(&self) -> AppResult<Vec<Room>> {
        let state = self.state.read();
        let mut rooms: Vec<Room> = state.rooms.values().filter(|room| !room.deleted).cloned().collect();
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }

    async fn nickname_taken(&self, nickname: &str, except: Option<&RoomId>) -> AppResult<bool> {
        Ok(self.state.read().nickname_taken(nickname, except))
    }

    async fn insert_message(&self, message: &Message) -> AppResult<()> {
        let mut state = self.state.write();
        let messages = state.messages.entry(message.room_id).or_default();
        if messages.contains_key(&message.id) {
            return Err(anyhow!("message {} already exists", message.id).into());
        }
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn query_messages(
        &self,
        room_id: &RoomId,
        range: &MessageRange,
        limit: usize,
    ) -> AppResult<Vec<Message>> {
        // BTreeMap::range panics on inverted bounds
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let state = self.state.read();
        let Some(messages) = state.messages.get(room_id) else {
            return Ok(Vec::new());
        };

        let window = messages.range((range.lower, range.upper)).map(|(_, message)| message);
        let page = if range.ascending {
            window.take(limit).cloned().collect()
        } else {
            window.rev().take(limit).cloned().collect()
        };
        Ok(page)
    }
}
