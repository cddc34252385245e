use std::fmt;

use thiserror::Error;

use crate::{
    appresult::AppError,
    id::{RoomId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Everything wrong with a room, one entry per failed rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, FieldError { field, message }) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field} {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("room is invalid: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("storage failure: {0}")]
    Store(AppError),
}

impl From<AppError> for SaveError {
    fn from(err: AppError) -> Self {
        Self::Store(err)
    }
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("room is invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("room creation failure: {0}")]
    Save(AppError),
}

/// Failure of `Rooms::configure` or `Rooms::delete`.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("login required")]
    NotLoggedIn,
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, Error)]
pub enum AddMemberError {
    #[error("login required")]
    NotLoggedIn,
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("user {0} already exists")]
    AlreadyMember(UserId),
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, Error)]
pub enum PostMessageError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("storage failure: {0}")]
    Save(AppError),
}
