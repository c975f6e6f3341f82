//! Duels, duel requests, duel reports and rating records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DuelId, DuelRequestId, MessageMarker, UserId};
use crate::user::{RatedUser, UserBrief};

/// Duel lifecycle state, derived from the completion timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    Active,
    Completed,
}

/// A timed contest between two (exceptionally three) users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duel {
    pub id: DuelId,
    /// Shared human-readable label; collisions across duels are permitted
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set exactly once, together with `completed_at`; `None` for a
    /// completed duel means nobody submitted a positive report
    pub winner_id: Option<UserId>,
}

impl Duel {
    pub fn status(&self) -> DuelStatus {
        if self.completed_at.is_some() {
            DuelStatus::Completed
        } else {
            DuelStatus::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Action a target user can take on a pending duel request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelRequestAction {
    Accept,
    Decline,
}

/// A time-limited proposal from one user to another to start a duel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelRequest {
    pub id: DuelRequestId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Marker of the outward notification sent to the target, if one was
    /// delivered and the gateway returned a handle for later editing
    pub message_marker: Option<MessageMarker>,
}

/// What an atomic delete-returning request removal yields.
///
/// Carries the party briefs so follow-up notifications need no extra reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedRequest {
    pub id: DuelRequestId,
    pub from_user: UserBrief,
    pub to_user: UserBrief,
    pub message_marker: Option<MessageMarker>,
}

/// A participant's submitted progress report for a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelReport {
    pub duel_id: DuelId,
    pub user_id: UserId,
    pub stitches: u32,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Report payload as submitted by a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelReportDraft {
    pub stitches: u32,
    pub note: Option<String>,
    pub photos: Vec<ReportPhoto>,
}

/// A single report photo, both as uploaded and as downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The content of a submitted report, as seen inside a [`FullDuel`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedReport {
    pub stitches: u32,
    pub note: Option<String>,
}

/// One participant of a duel together with their report, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelParticipantInfo {
    pub user: UserBrief,
    pub report: Option<SubmittedReport>,
}

/// A duel with its participants and their reports, the shape completion
/// and report submission operate on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullDuel {
    pub id: DuelId,
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub participants: Vec<DuelParticipantInfo>,
}

impl FullDuel {
    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn participant(&self, user_id: UserId) -> Option<&DuelParticipantInfo> {
        self.participants.iter().find(|p| p.user.id == user_id)
    }
}

/// An active duel with participant profiles, for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveDuel {
    pub id: DuelId,
    pub codeword: String,
    pub started_at: DateTime<Utc>,
    pub participants: Vec<RatedUser>,
}

/// An active duel as presented to consumers, with the deadline resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveDuelWithDeadline {
    pub id: DuelId,
    pub codeword: String,
    pub deadline: DateTime<Utc>,
    pub participants: Vec<RatedUser>,
}

/// A completed duel as it appears in the monthly archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedDuel {
    pub id: DuelId,
    pub codeword: String,
    pub completed_at: DateTime<Utc>,
    pub winner_id: Option<UserId>,
    pub participant_ids: Vec<UserId>,
}

/// Win/participation counts for one user over a rating period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user: RatedUser,
    pub total_duels_won: u32,
    pub total_duels_participated: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_status_derivation() {
        let mut duel = Duel {
            id: DuelId::new(),
            codeword: "gusset".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            winner_id: None,
        };
        assert_eq!(duel.status(), DuelStatus::Active);
        assert!(duel.is_active());

        duel.completed_at = Some(Utc::now());
        assert_eq!(duel.status(), DuelStatus::Completed);
        assert!(!duel.is_active());
    }
}
