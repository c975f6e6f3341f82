//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use stitchduel_types::{
    Duel, DuelId, DuelReport, DuelRequest, DuelRequestId, MessageMarker, PairingCandidate,
    RatedUser, RatingRecord, RemovedRequest, SkillTier, User, UserBrief, UserId,
};

use crate::error::{DbError, DbResult};

pub(crate) fn parse_tier(raw: &str) -> DbResult<SkillTier> {
    SkillTier::parse(raw).ok_or_else(|| DbError::Decode(format!("unknown skill tier: {raw}")))
}

// ============================================================================
// User Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub skill_tier: String,
    pub active: bool,
    pub weekly_duels_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUser {
    pub fn into_user(self) -> DbResult<User> {
        Ok(User {
            id: UserId(self.id),
            tier: parse_tier(&self.skill_tier)?,
            fullname: self.fullname,
            photo_url: self.photo_url,
            active: self.active,
            weekly_duels_opt_in: self.weekly_duels_opt_in,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUserBrief {
    pub id: Uuid,
    pub fullname: String,
}

impl DbUserBrief {
    pub fn into_brief(self) -> UserBrief {
        UserBrief {
            id: UserId(self.id),
            fullname: self.fullname,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRatedUser {
    pub id: Uuid,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub skill_tier: String,
}

impl DbRatedUser {
    pub fn into_rated(self) -> DbResult<RatedUser> {
        Ok(RatedUser {
            id: UserId(self.id),
            tier: parse_tier(&self.skill_tier)?,
            fullname: self.fullname,
            photo_url: self.photo_url,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPairingCandidate {
    pub id: Uuid,
    pub fullname: String,
    pub skill_tier: String,
}

impl DbPairingCandidate {
    pub fn into_candidate(self) -> DbResult<PairingCandidate> {
        Ok(PairingCandidate {
            id: UserId(self.id),
            tier: parse_tier(&self.skill_tier)?,
            fullname: self.fullname,
        })
    }
}

// ============================================================================
// Duel Request Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbDuelRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message_marker: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl DbDuelRequest {
    pub fn into_request(self) -> DuelRequest {
        DuelRequest {
            id: DuelRequestId(self.id),
            from_user_id: UserId(self.from_user_id),
            to_user_id: UserId(self.to_user_id),
            created_at: self.created_at,
            message_marker: self.message_marker.map(MessageMarker),
        }
    }
}

/// Row shape of the delete-returning request removal
#[derive(Debug, Clone, FromRow)]
pub struct DbRemovedRequest {
    pub id: Uuid,
    pub message_marker: Option<i64>,
    pub from_user_id: Uuid,
    pub from_fullname: String,
    pub to_user_id: Uuid,
    pub to_fullname: String,
}

impl DbRemovedRequest {
    pub fn into_removed(self) -> RemovedRequest {
        RemovedRequest {
            id: DuelRequestId(self.id),
            from_user: UserBrief {
                id: UserId(self.from_user_id),
                fullname: self.from_fullname,
            },
            to_user: UserBrief {
                id: UserId(self.to_user_id),
                fullname: self.to_fullname,
            },
            message_marker: self.message_marker.map(MessageMarker),
        }
    }
}

// ============================================================================
// Duel Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbDuel {
    pub id: Uuid,
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub winner_id: Option<Uuid>,
}

impl DbDuel {
    pub fn into_duel(self) -> Duel {
        Duel {
            id: DuelId(self.id),
            codeword: self.codeword,
            started_at: self.started_at,
            completed_at: self.completed_at,
            winner_id: self.winner_id.map(UserId),
        }
    }
}

/// One row per participant of a duel, with their report when present
#[derive(Debug, Clone, FromRow)]
pub struct DbFullDuelRow {
    pub id: Uuid,
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub fullname: String,
    pub stitches: Option<i32>,
    pub note: Option<String>,
}

/// One row per participant of an active duel
#[derive(Debug, Clone, FromRow)]
pub struct DbActiveDuelRow {
    pub id: Uuid,
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub skill_tier: String,
}

/// One row per participant of an archived duel
#[derive(Debug, Clone, FromRow)]
pub struct DbArchivedDuelRow {
    pub id: Uuid,
    pub codeword: String,
    pub completed_at: DateTime<Utc>,
    pub winner_id: Option<Uuid>,
    pub user_id: Uuid,
}

// ============================================================================
// Report & Rating Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct DbDuelReport {
    pub duel_id: Uuid,
    pub user_id: Uuid,
    pub stitches: i32,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl DbDuelReport {
    pub fn into_report(self) -> DuelReport {
        DuelReport {
            duel_id: DuelId(self.duel_id),
            user_id: UserId(self.user_id),
            stitches: self.stitches.max(0) as u32,
            note: self.note,
            submitted_at: self.submitted_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRatingRow {
    pub user_id: Uuid,
    pub fullname: String,
    pub photo_url: Option<String>,
    pub skill_tier: String,
    pub total_duels_won: i64,
    pub total_duels_participated: i64,
}

impl DbRatingRow {
    pub fn into_record(self) -> DbResult<RatingRecord> {
        Ok(RatingRecord {
            user: RatedUser {
                id: UserId(self.user_id),
                tier: parse_tier(&self.skill_tier)?,
                fullname: self.fullname,
                photo_url: self.photo_url,
            },
            total_duels_won: self.total_duels_won.max(0) as u32,
            total_duels_participated: self.total_duels_participated.max(0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tier_rejects_unknown() {
        assert!(parse_tier("novice").is_ok());
        assert!(matches!(parse_tier("wizard"), Err(DbError::Decode(_))));
    }
}
