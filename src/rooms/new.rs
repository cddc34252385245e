use serde::Deserialize;

use super::room::Yaml;

/// What a caller supplies to open a room.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub title: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default = "public_by_default")]
    pub is_public: bool,
    #[serde(default)]
    pub yaml: Yaml,
}

fn public_by_default() -> bool {
    true
}

impl NewRoom {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nickname: None,
            is_public: public_by_default(),
            yaml: Yaml::new(),
        }
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Edits applied by `Rooms::configure`. `None` leaves a field alone;
/// `nickname: Some(String::new())` clears the nickname.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub yaml: Option<Yaml>,
}

impl RoomChanges {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}
