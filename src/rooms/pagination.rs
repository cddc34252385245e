//! Message paging.
//!
//! Pages are cut from a room's messages in id order. A page request turns
//! into a [`PagePlan`]: a [`MessageRange`] the store can answer directly
//! (bounds, direction, nothing else) and whether the store's answer has to
//! be flipped before it reaches the caller.
//!
//! Leaving the order unspecified is its own mode, not an alias for either
//! direction. Unspecified `messages` gives the newest page oldest-first;
//! unspecified `messages_between` walks in from `since` (or down from
//! `until` when only that is given) and keeps that walking order.

use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::id::MessageId;

use super::msg::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Chronological.
    Asc,
    /// Newest first.
    Desc,
}

/// One end of a page: a message id and whether that message is part of
/// the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: MessageId,
    pub include_boundary: bool,
}

impl Cursor {
    pub fn inclusive(id: MessageId) -> Self {
        Self { id, include_boundary: true }
    }

    pub fn exclusive(id: MessageId) -> Self {
        Self { id, include_boundary: false }
    }

    fn bound(self) -> Bound<MessageId> {
        if self.include_boundary {
            Bound::Included(self.id)
        } else {
            Bound::Excluded(self.id)
        }
    }
}

/// A slice of one room's messages, walked from one end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRange {
    pub lower: Bound<MessageId>,
    pub upper: Bound<MessageId>,
    /// Walk up from `lower` when true, down from `upper` otherwise.
    pub ascending: bool,
}

impl MessageRange {
    pub fn all(ascending: bool) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            ascending,
        }
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        let above = match self.lower {
            Bound::Included(lower) => *id >= lower,
            Bound::Excluded(lower) => *id > lower,
            Bound::Unbounded => true,
        };
        let below = match self.upper {
            Bound::Included(upper) => *id <= upper,
            Bound::Excluded(upper) => *id < upper,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// True when no id can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Bound::Included(lower), Bound::Included(upper)) => lower > upper,
            (Bound::Included(lower), Bound::Excluded(upper))
            | (Bound::Excluded(lower), Bound::Included(upper))
            | (Bound::Excluded(lower), Bound::Excluded(upper)) => lower >= upper,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub range: MessageRange,
    /// Flip the store's answer before handing it out.
    pub reverse: bool,
}

impl PagePlan {
    /// The newest or oldest messages of a room.
    pub fn latest(order: Option<Order>) -> Self {
        match order {
            None => Self { range: MessageRange::all(false), reverse: true },
            Some(Order::Asc) => Self { range: MessageRange::all(true), reverse: false },
            Some(Order::Desc) => Self { range: MessageRange::all(false), reverse: false },
        }
    }

    pub fn between(since: Option<Cursor>, until: Option<Cursor>, order: Option<Order>) -> Self {
        let from_top = match order {
            Some(Order::Desc) => true,
            _ => since.is_none() && until.is_some(),
        };
        let reverse = match order {
            Some(Order::Asc) => from_top,
            Some(Order::Desc) => !from_top,
            None => false,
        };

        Self {
            range: MessageRange {
                lower: since.map_or(Bound::Unbounded, Cursor::bound),
                upper: until.map_or(Bound::Unbounded, Cursor::bound),
                ascending: !from_top,
            },
            reverse,
        }
    }

    pub fn assemble(&self, mut page: Vec<Message>) -> Vec<Message> {
        if self.reverse {
            page.reverse();
        }
        page
    }
}
