//! Scheduled task payloads
//!
//! Every deferred piece of work is handed to the scheduled-task gateway as
//! one of these payloads and later comes back as a fresh inbound call. The
//! handlers behind them are idempotent, so at-least-once delivery is fine.

use serde::{Deserialize, Serialize};

use crate::id::{DuelId, DuelRequestId, UserId};

/// A deferred engine invocation, serialized into the task queue body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScheduledTask {
    /// Remove a duel request once its validity period has elapsed
    CancelDuelRequest { request_id: DuelRequestId },
    /// Complete a duel at its deadline
    CompleteDuel { duel_id: DuelId },
    /// Remind a participant who has not yet submitted a report
    RemindDuelReport { duel_id: DuelId, user_id: UserId },
    /// Delete a duel's report media after results were posted
    CleanupReportMedia { duel_id: DuelId },
    /// Draw the weekly random duel batch
    CreateWeeklyRandomDuels,
    /// Publish the previous month's rating and celebrate the winners
    PublishMonthlyRating,
}

impl ScheduledTask {
    /// Queue name the task belongs to, for gateways that shard by queue
    pub fn queue(&self) -> &'static str {
        match self {
            Self::CancelDuelRequest { .. } => "duel-request-cancellation",
            Self::CompleteDuel { .. } => "duel-completion",
            Self::RemindDuelReport { .. } => "duel-report-reminder",
            Self::CleanupReportMedia { .. } => "report-media-cleanup",
            Self::CreateWeeklyRandomDuels => "weekly-random-duels",
            Self::PublishMonthlyRating => "monthly-rating",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serde_roundtrip() {
        let task = ScheduledTask::RemindDuelReport {
            duel_id: DuelId::new(),
            user_id: UserId::new(),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("remind-duel-report"));
        let back: ScheduledTask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
