//! User profiles and skill tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Self-reported skill tier, used to group users for weekly pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillTier {
    Novice,
    Intermediate,
    Advanced,
}

impl SkillTier {
    /// All tiers in pairing order
    pub const ALL: [SkillTier; 3] = [Self::Novice, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Novice => "novice",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "novice" => Some(Self::Novice),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for SkillTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub tier: SkillTier,
    /// Inactive users are excluded from pairing and rating
    pub active: bool,
    /// Whether the user opted into the weekly random duel batch
    pub weekly_duels_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The projection of a user the engine hands to notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: UserId,
    pub fullname: String,
}

/// A user eligible for the weekly random duel batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingCandidate {
    pub id: UserId,
    pub fullname: String,
    pub tier: SkillTier,
}

impl PairingCandidate {
    pub fn brief(&self) -> UserBrief {
        UserBrief {
            id: self.id,
            fullname: self.fullname.clone(),
        }
    }
}

/// User projection carried in rating records and opponent listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedUser {
    pub id: UserId,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub tier: SkillTier,
}
