use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($Name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $Name(pub Uuid);

        impl $Name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $Name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(RoomId);
uuid_id!(UserId);
uuid_id!(MessageId);

impl MessageId {
    /// Next id for a room whose newest message is `previous`.
    ///
    /// v7 ids sort by creation time, but two ids minted in the same
    /// millisecond (or after a clock step back) may not. The result is
    /// always strictly greater than `previous`.
    pub fn next_after(previous: Option<MessageId>) -> MessageId {
        let candidate = Uuid::now_v7();
        match previous {
            Some(MessageId(prev)) if candidate <= prev => {
                MessageId(Uuid::from_u128(prev.as_u128().wrapping_add(1)))
            }
            _ => MessageId(candidate),
        }
    }
}
