use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::{MessageId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl Message {
    /// A message that sorts after `previous`, the room's current newest.
    pub(crate) fn next(
        room_id: RoomId,
        previous: Option<MessageId>,
        body: String,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: MessageId::next_after(previous),
            room_id,
            body,
            created_at,
        }
    }
}
