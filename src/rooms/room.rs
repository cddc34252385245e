use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{id::RoomId, users::User};

use super::{error::ValidationErrors, new::NewRoom};

/// Free-form extension data attached to a room.
pub type Yaml = BTreeMap<String, serde_yaml::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub title: String,
    pub nickname: Option<String>,
    pub user: Option<User>,
    pub is_public: bool,
    pub members: Vec<User>,
    pub deleted: bool,
    pub updated_at: OffsetDateTime,
    pub yaml: Yaml,
}

impl Room {
    pub fn new(
        NewRoom { title, nickname, is_public, yaml }: NewRoom,
        owner: Option<&User>,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: RoomId::new(),
            title,
            nickname: normalize_nickname(nickname),
            user: owner.cloned(),
            is_public,
            members: Vec::new(),
            deleted: false,
            updated_at: timestamp,
            yaml,
        }
    }

    /// Checks that need nothing but the room itself.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.add("title", "can't be blank");
        }
        errors.into_result()
    }

    /// The nickname when set, else the id. Either resolves back to this room.
    pub fn to_param(&self) -> String {
        match &self.nickname {
            Some(nickname) if !nickname.is_empty() => nickname.clone(),
            _ => self.id.to_string(),
        }
    }

    pub fn has_member(&self, user: &User) -> bool {
        self.members.iter().any(|member| member.id == user.id)
    }

    pub fn to_json(&self) -> RoomJson {
        RoomJson {
            id: self.id,
            param: self.to_param(),
            name: self.title.clone(),
            user: self.user.clone(),
            nickname: self.nickname.clone(),
            is_public: self.is_public,
            updated_at: self.updated_at.to_string(),
            members: self.members.clone(),
        }
    }
}

/// Empty nicknames behave exactly like no nickname.
pub(crate) fn normalize_nickname(nickname: Option<String>) -> Option<String> {
    nickname.filter(|nickname| !nickname.is_empty())
}

/// External shape of a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomJson {
    pub id: RoomId,
    pub param: String,
    pub name: String,
    pub user: Option<User>,
    pub nickname: Option<String>,
    pub is_public: bool,
    pub updated_at: String,
    pub members: Vec<User>,
}
