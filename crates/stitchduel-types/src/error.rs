//! Error types for duel lifecycle operations
//!
//! Domain-rule violations surface as typed variants so an outer API layer
//! can map them to conflict/forbidden responses without string matching.

use thiserror::Error;

use crate::id::{DuelId, DuelRequestId, UserId};

/// Errors that can occur during duel lifecycle operations
#[derive(Debug, Error)]
pub enum DuelError {
    #[error("duel {0} not found")]
    DuelNotFound(DuelId),

    #[error("duel request {0} not found")]
    RequestNotFound(DuelRequestId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("not allowed to perform this action")]
    NotAllowed,

    #[error("user {0} is already participating in a duel")]
    UserAlreadyInDuel(UserId),

    #[error("the other user {0} is already participating in a duel")]
    OtherUserAlreadyInDuel(UserId),

    #[error("duel {0} is not active")]
    DuelNotActive(DuelId),

    #[error("duels are paused until the weekly random duels are drawn")]
    BlackoutWindow,

    #[error("not enough users to create pairs: {count}")]
    NotEnoughUsers { count: usize },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Store(String),
}

/// Result type for duel lifecycle operations
pub type DuelResult<T> = std::result::Result<T, DuelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_ids() {
        let id = DuelId::new();
        let err = DuelError::DuelNotActive(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
