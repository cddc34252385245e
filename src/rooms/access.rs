use crate::{id::UserId, users::User};

use super::room::Room;

impl Room {
    /// Public rooms are open to everyone, anonymous viewers included.
    /// Private rooms only to their owner and members.
    pub fn is_accessible(&self, user: Option<&UserId>) -> bool {
        if self.is_public {
            return true;
        }
        let Some(user) = user else {
            return false;
        };

        self.user.as_ref().is_some_and(|owner| owner.id == *user)
            || self.members.iter().any(|member| member.id == *user)
    }

    /// Everyone with access to a private room, owner first. Public rooms
    /// have no such list.
    pub fn owner_and_members(&self) -> Vec<&User> {
        if self.is_public {
            return Vec::new();
        }
        self.user.iter().chain(self.members.iter()).collect()
    }
}
