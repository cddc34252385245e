mod access;
mod error;
mod locks;
mod msg;
mod new;
mod pagination;
mod room;

pub use error::{
    AddMemberError, ConfigureError, CreateError, FieldError, PostMessageError, SaveError,
    ValidationErrors,
};
pub use msg::Message;
pub use new::{NewRoom, RoomChanges};
pub use pagination::{Cursor, MessageRange, Order, PagePlan};
pub use room::{Room, RoomJson, Yaml};

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    id::{RoomId, UserId},
    setting::Settings,
    store::Store,
    users::User,
    AppResult,
};

use locks::{RoomGuard, RoomLocks};
use room::normalize_nickname;

/// Room lifecycle, membership and message paging over a [`Store`].
#[derive(Clone)]
pub struct Rooms {
    store: Arc<dyn Store>,
    settings: Arc<Settings>,
    locks: Arc<RoomLocks>,
}

impl Rooms {
    pub fn new(store: Arc<dyn Store>, settings: Arc<Settings>) -> Self {
        Self {
            store,
            settings,
            locks: Arc::default(),
        }
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    pub async fn register_user(&self, name: impl Into<String>) -> AppResult<User> {
        let user = User::new(name);
        self.store.insert_user(&user).await?;
        debug!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Every rule a stored room must satisfy, nickname uniqueness included.
    /// Collects rather than stops at the first failure.
    pub async fn validate(&self, room: &Room) -> AppResult<Result<(), ValidationErrors>> {
        let mut errors = match room.validate() {
            Ok(()) => ValidationErrors::default(),
            Err(errors) => errors,
        };

        if let Some(nickname) = &room.nickname {
            if !room.deleted && self.store.nickname_taken(nickname, Some(&room.id)).await? {
                errors.add("nickname", "is already taken");
            }
        }

        Ok(errors.into_result())
    }

    pub async fn create(
        &self,
        new_room: NewRoom,
        owner: Option<&User>,
        timestamp: OffsetDateTime,
    ) -> Result<Room, CreateError> {
        let room = Room::new(new_room, owner, timestamp);

        let _nicknames = self.locks.nicknames().await;
        self.validate(&room)
            .await
            .map_err(CreateError::Save)?
            .map_err(CreateError::Invalid)?;
        self.store.insert_room(&room).await.map_err(CreateError::Save)?;

        info!(room_id = %room.id, title = %room.title, "room created");
        Ok(room)
    }

    /// A live room by id or nickname, if `viewer` may see it.
    pub async fn find(&self, room_ref: &str, viewer: Option<&UserId>) -> AppResult<Option<Room>> {
        Ok(self
            .resolve(room_ref)
            .await?
            .filter(|room| room.is_accessible(viewer)))
    }

    pub async fn all_live(&self, viewer: Option<&UserId>) -> AppResult<Vec<Room>> {
        let mut rooms = self.store.list_non_deleted_rooms().await?;
        rooms.retain(|room| room.is_accessible(viewer));
        Ok(rooms)
    }

    pub async fn configure(
        &self,
        room_ref: &str,
        actor: Option<&User>,
        changes: RoomChanges,
    ) -> Result<Room, ConfigureError> {
        let Some(actor) = actor else {
            return Err(ConfigureError::NotLoggedIn);
        };
        let (_guard, mut room) = self
            .lock_live(room_ref, &actor.id)
            .await
            .map_err(SaveError::from)?
            .ok_or_else(|| ConfigureError::RoomNotFound(room_ref.to_owned()))?;

        let RoomChanges { title, nickname, is_public, yaml } = changes;
        let renaming = nickname.is_some();
        if let Some(title) = title {
            room.title = title;
        }
        if let Some(nickname) = nickname {
            room.nickname = normalize_nickname(Some(nickname));
        }
        if let Some(is_public) = is_public {
            room.is_public = is_public;
        }
        if let Some(yaml) = yaml {
            room.yaml = yaml;
        }
        room.updated_at = OffsetDateTime::now_utc();

        let _nicknames = if renaming { Some(self.locks.nicknames().await) } else { None };
        self.save(&room).await?;

        info!(room_id = %room.id, "room configured");
        Ok(room)
    }

    /// Soft delete: the room stays in the store, out of every listing.
    pub async fn delete(&self, room_ref: &str, actor: Option<&User>) -> Result<Room, ConfigureError> {
        let Some(actor) = actor else {
            return Err(ConfigureError::NotLoggedIn);
        };
        let (_guard, mut room) = self
            .lock_live(room_ref, &actor.id)
            .await
            .map_err(SaveError::from)?
            .ok_or_else(|| ConfigureError::RoomNotFound(room_ref.to_owned()))?;

        room.deleted = true;
        room.updated_at = OffsetDateTime::now_utc();
        self.save(&room).await?;

        info!(room_id = %room.id, "room deleted");
        Ok(room)
    }

    pub async fn add_member(
        &self,
        room_ref: &str,
        actor: Option<&User>,
        user_id: &UserId,
    ) -> Result<(), AddMemberError> {
        let Some(actor) = actor else {
            return Err(AddMemberError::NotLoggedIn);
        };
        let (_guard, mut room) = self
            .lock_live(room_ref, &actor.id)
            .await
            .map_err(SaveError::from)?
            .ok_or_else(|| AddMemberError::RoomNotFound(room_ref.to_owned()))?;

        let user = self
            .store
            .find_user(user_id)
            .await
            .map_err(SaveError::from)?
            .ok_or(AddMemberError::UserNotFound(*user_id))?;

        if room.has_member(&user) {
            debug!(room_id = %room.id, user_id = %user.id, "already a member");
            return Err(AddMemberError::AlreadyMember(user.id));
        }

        room.members.push(user);
        room.updated_at = OffsetDateTime::now_utc();
        self.save(&room).await?;

        info!(room_id = %room.id, user_id = %user_id, "member added");
        Ok(())
    }

    pub async fn post_message(
        &self,
        room_id: &RoomId,
        body: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Result<Message, PostMessageError> {
        let _guard = self.locks.room(*room_id).await;

        match self.store.find_room_by_id(room_id).await {
            Ok(Some(room)) if !room.deleted => {}
            Ok(_) => return Err(PostMessageError::RoomNotFound(*room_id)),
            Err(err) => return Err(PostMessageError::Save(err)),
        }

        let newest = self
            .store
            .query_messages(room_id, &MessageRange::all(false), 1)
            .await
            .map_err(PostMessageError::Save)?;

        let message = Message::next(*room_id, newest.first().map(|m| m.id), body.into(), timestamp);
        self.store
            .insert_message(&message)
            .await
            .map_err(PostMessageError::Save)?;

        debug!(room_id = %room_id, message_id = %message.id, "message posted");
        Ok(message)
    }

    /// The newest (or, for [`Order::Asc`], oldest) `limit` messages.
    pub async fn messages(
        &self,
        room_id: &RoomId,
        limit: usize,
        order: Option<Order>,
    ) -> AppResult<Vec<Message>> {
        self.page(room_id, PagePlan::latest(order), limit).await
    }

    pub async fn messages_between(
        &self,
        room_id: &RoomId,
        since: Option<Cursor>,
        until: Option<Cursor>,
        limit: usize,
        order: Option<Order>,
    ) -> AppResult<Vec<Message>> {
        self.page(room_id, PagePlan::between(since, until, order), limit).await
    }

    async fn page(&self, room_id: &RoomId, plan: PagePlan, limit: usize) -> AppResult<Vec<Message>> {
        let limit = limit.min(self.settings.max_page_size);
        if limit == 0 || plan.range.is_empty() {
            return Ok(Vec::new());
        }

        let page = self.store.query_messages(room_id, &plan.range, limit).await?;
        Ok(plan.assemble(page))
    }

    async fn resolve(&self, room_ref: &str) -> AppResult<Option<Room>> {
        if let Ok(id) = room_ref.parse::<RoomId>() {
            if let Some(room) = self.store.find_room_by_id(&id).await? {
                return Ok(Some(room).filter(|room| !room.deleted));
            }
        }
        self.store.find_room_by_nickname(room_ref).await
    }

    /// Resolves `room_ref`, takes the room's lock and re-reads it so the
    /// caller acts on what is stored now. Rooms `actor` cannot see resolve
    /// to `None`, same as missing ones.
    async fn lock_live(
        &self,
        room_ref: &str,
        actor: &UserId,
    ) -> AppResult<Option<(RoomGuard<'_>, Room)>> {
        let Some(room) = self.resolve(room_ref).await? else {
            return Ok(None);
        };

        let guard = self.locks.room(room.id).await;
        match self.store.find_room_by_id(&room.id).await? {
            Some(room) if !room.deleted && room.is_accessible(Some(actor)) => {
                Ok(Some((guard, room)))
            }
            _ => Ok(None),
        }
    }

    async fn save(&self, room: &Room) -> Result<(), SaveError> {
        if let Err(errors) = self.validate(room).await? {
            warn!(room_id = %room.id, %errors, "room failed validation");
            return Err(SaveError::Invalid(errors));
        }
        self.store.update_room(room).await?;
        Ok(())
    }
}
