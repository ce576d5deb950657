use thiserror::Error;
use uuid::Uuid;

use crate::models::Role;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Insufficient permissions for role {role}")]
    Forbidden { role: Role },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejection for a write that references a user who does not exist.
pub fn unknown_user(user_id: Uuid) -> Error {
    Error::InvalidInput(format!("no user with id {user_id}"))
}

impl Error {
    /// HTTP-equivalent status for a request layer to render.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Forbidden { .. } => 403,
            Error::InvalidInput(_) => 400,
            Error::Conflict(_) => 409,
            Error::CorruptRow(_)
            | Error::Storage(_)
            | Error::Serialization(_)
            | Error::Io(_) => 500,
        }
    }

    /// Message safe to hand back to a caller. Internal failures never leak details.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}
