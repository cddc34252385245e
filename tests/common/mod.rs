#![allow(dead_code)]

use std::sync::Arc;

use chatrooms::{
    db::SqliteStore,
    id::MessageId,
    rooms::{Message, NewRoom, Room, Rooms},
    setting::Settings,
    store::MemoryStore,
    users::User,
};
use time::OffsetDateTime;

pub fn memory_rooms() -> Rooms {
    memory_rooms_with(Settings::default())
}

pub async fn sqlite_rooms() -> Rooms {
    sqlite_rooms_with(Settings::default()).await
}

pub fn memory_rooms_with(settings: Settings) -> Rooms {
    Rooms::new(Arc::new(MemoryStore::new()), Arc::new(settings))
}

pub async fn sqlite_rooms_with(settings: Settings) -> Rooms {
    let store = SqliteStore::in_memory().await.expect("failed to open sqlite");
    Rooms::new(Arc::new(store), Arc::new(settings))
}

/// Runs an `async fn(Rooms)` against each store.
macro_rules! with_each_store {
    ($($check:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $check() {
                    super::$check($crate::common::memory_rooms()).await;
                }
            )*
        }

        mod sqlite {
            $(
                #[tokio::test]
                async fn $check() {
                    super::$check($crate::common::sqlite_rooms().await).await;
                }
            )*
        }
    };
}

pub async fn open(rooms: &Rooms, new_room: NewRoom, owner: Option<&User>) -> Room {
    rooms
        .create(new_room, owner, OffsetDateTime::now_utc())
        .await
        .expect("failed to create room")
}

/// A room holding messages 0..=10, oldest first.
pub async fn room_with_messages(rooms: &Rooms) -> (Room, Vec<Message>) {
    let room = open(rooms, NewRoom::titled("room1").nickname("nickname"), None).await;

    let mut messages = Vec::new();
    for i in 0..=10 {
        let message = rooms
            .post_message(&room.id, format!("body of message {i}"), OffsetDateTime::now_utc())
            .await
            .expect("failed to post message");
        messages.push(message);
    }

    (room, messages)
}

pub fn ids(page: &[Message]) -> Vec<MessageId> {
    page.iter().map(|message| message.id).collect()
}

/// Ids of `messages[i]` for each index, in the order given.
pub fn picks(messages: &[Message], indices: &[usize]) -> Vec<MessageId> {
    indices.iter().map(|&i| messages[i].id).collect()
}
