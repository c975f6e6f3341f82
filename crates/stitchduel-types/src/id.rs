//! Identity newtypes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuelId(pub Uuid);

impl DuelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DuelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DuelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duel request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuelRequestId(pub Uuid);

impl DuelRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DuelRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DuelRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque marker for an outward notification message, returned by the
/// notification gateway and stored so the message can be edited later
/// (e.g. when a pending duel request is invalidated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageMarker(pub i64);

impl std::fmt::Display for MessageMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
