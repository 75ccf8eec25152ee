use std::fmt;

use thiserror::Error;

/// Kinds of records kept in the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Post,
    User,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Post => f.write_str("chirp"),
            Entity::User => f.write_str("user"),
        }
    }
}

/// Why a login attempt was rejected. Callers must not reveal which one to
/// the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialFailure {
    #[error("no user with that email")]
    UserNotFound,
    #[error("password did not match")]
    PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("database file is corrupt: {0}")]
    CorruptState(String),

    #[error("{0} {1} not found")]
    NotFound(Entity, u64),

    #[error("email already in use: {0}")]
    Conflict(String),

    #[error("user {user_id} is not the author of chirp {post_id}")]
    Unauthorized { post_id: u64, user_id: u64 },

    #[error("invalid credentials: {0}")]
    InvalidCredentials(CredentialFailure),
}

pub type StoreResult<T> = Result<T, StoreError>;
