//! Database error types

use thiserror::Error;
use uuid::Uuid;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("User {0} already participates in an active duel")]
    ParticipantBusy(Uuid),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for stitchduel_types::DuelError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ParticipantBusy(user_id) => {
                stitchduel_types::DuelError::UserAlreadyInDuel(stitchduel_types::UserId(user_id))
            }
            other => stitchduel_types::DuelError::Store(other.to_string()),
        }
    }
}
