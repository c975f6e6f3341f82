//! Gateway ports — the ONLY surface through which the engine touches the
//! outside world.
//!
//! Each port is a narrow trait injected at construction time: persistence
//! ([`DuelStore`]), deferred work ([`TaskScheduler`]), outward messaging
//! ([`Notifier`]) and report media ([`MediaStore`]). Adapters live in their
//! own crates; the engine never sees a connection pool, an HTTP client or a
//! bucket handle.
//!
//! # Transactional contract
//!
//! Every state-changing [`DuelStore`] operation executes as a single atomic
//! transaction. In particular [`DuelStore::create_duel`] checks "is any
//! participant already in an active duel" inside the same transaction as
//! the insert it gates and reports the busy user as
//! [`DuelError::UserAlreadyInDuel`], so two concurrent accepts cannot place
//! one user in two duels.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stitchduel_types::{
    ActiveDuel, ArchivedDuel, Duel, DuelId, DuelReport, DuelRequest, DuelRequestId, DuelResult,
    FullDuel, MessageMarker, PairingCandidate, RatedUser, RatingRecord, RemovedRequest,
    ReportPhoto, ScheduledTask, SubmittedReport, UserBrief, UserId,
};

// Re-exported for adapter crates; the engine itself only names the traits.
pub use stitchduel_types::DuelError;

/// Transactional persistence over users, requests, duels, reports and
/// rating records
#[async_trait]
pub trait DuelStore: Send + Sync {
    // ── Users ────────────────────────────────────────────────────────────

    async fn get_user_brief(&self, user_id: UserId) -> DuelResult<Option<UserBrief>>;

    /// Active users not currently in an active duel
    async fn users_available_for_duel(&self) -> DuelResult<Vec<RatedUser>>;

    /// Active, opted-in users not currently in an active duel, with tiers
    async fn users_for_weekly_duels(&self) -> DuelResult<Vec<PairingCandidate>>;

    // ── Duel requests ────────────────────────────────────────────────────

    /// Bulk insert one pending request per target, silently skipping any
    /// (from, to) pair that already has a pending request. Returns only
    /// the rows actually created.
    async fn create_requests(
        &self,
        from_user_id: UserId,
        to_user_ids: &[UserId],
    ) -> DuelResult<Vec<DuelRequest>>;

    async fn get_request(&self, id: DuelRequestId) -> DuelResult<Option<DuelRequest>>;

    /// Pending requests addressed to a user, newest first
    async fn requests_for_user(&self, user_id: UserId) -> DuelResult<Vec<DuelRequest>>;

    async fn set_request_marker(
        &self,
        id: DuelRequestId,
        marker: MessageMarker,
    ) -> DuelResult<()>;

    /// Atomically delete a request, returning the party briefs it carried.
    /// `None` when the request was already gone.
    async fn remove_request(&self, id: DuelRequestId) -> DuelResult<Option<RemovedRequest>>;

    /// Other pending requests from the same sender
    async fn sibling_requests(
        &self,
        from_user_id: UserId,
        exclude: DuelRequestId,
    ) -> DuelResult<Vec<DuelRequest>>;

    // ── Duels ────────────────────────────────────────────────────────────

    /// `true` if the user participates in an active duel (the given one,
    /// or any duel when `duel_id` is `None`)
    async fn user_in_active_duel(
        &self,
        user_id: UserId,
        duel_id: Option<DuelId>,
    ) -> DuelResult<bool>;

    /// Create a duel with its participants in one transaction, verifying
    /// inside that transaction that no participant is already in an active
    /// duel. A conflict surfaces as [`DuelError::UserAlreadyInDuel`] with
    /// the busy user's id.
    async fn create_duel(&self, codeword: &str, participants: &[UserId]) -> DuelResult<Duel>;

    /// Batch variant of [`Self::create_duel`]: all duels and participants
    /// of a weekly draw in one transaction, sharing one codeword. Groups
    /// are size 2, exceptionally 3.
    async fn create_duels_batch(
        &self,
        codeword: &str,
        groups: &[Vec<UserId>],
    ) -> DuelResult<Vec<Duel>>;

    async fn get_duel(&self, id: DuelId) -> DuelResult<Option<Duel>>;

    async fn get_full_duel(&self, id: DuelId) -> DuelResult<Option<FullDuel>>;

    async fn active_duels(&self) -> DuelResult<Vec<ActiveDuel>>;

    async fn completed_duels_by_month(
        &self,
        year: i32,
        month: u32,
    ) -> DuelResult<Vec<ArchivedDuel>>;

    /// Set the completion timestamp and winner, exactly once. Returns
    /// `false` when the duel was already completed (a concurrent or
    /// duplicate callback won the race), in which case nothing changed.
    async fn complete_duel(&self, id: DuelId, winner: Option<UserId>) -> DuelResult<bool>;

    // ── Duel reports ─────────────────────────────────────────────────────

    /// Insert or replace the (duel, user) report row
    async fn upsert_report(
        &self,
        duel_id: DuelId,
        user_id: UserId,
        stitches: u32,
        note: Option<&str>,
    ) -> DuelResult<DuelReport>;

    async fn get_report(&self, duel_id: DuelId, user_id: UserId)
        -> DuelResult<Option<DuelReport>>;

    // ── Rating ───────────────────────────────────────────────────────────

    /// Current-period counts per active user, unordered
    async fn current_rating(&self) -> DuelResult<Vec<RatingRecord>>;

    /// Prior-calendar-month counts, zero-activity users excluded, ordered
    /// by wins then participation, both descending
    async fn previous_month_rating(&self) -> DuelResult<Vec<RatingRecord>>;

    /// Refresh the materialized rating store; called after every duel
    /// completion so rating reads are at most one completion stale
    async fn refresh_rating(&self) -> DuelResult<()>;
}

/// Fire-and-forget deferred work. A scheduled task later reappears as a
/// fresh inbound engine call; there is no cancellation API — stale
/// callbacks die on the handlers' idempotency checks.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule(&self, task: ScheduledTask, delay: Duration) -> DuelResult<()>;
}

/// Everything the engine posts about a completed duel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelResults {
    pub duel_id: DuelId,
    pub codeword: String,
    pub participants: Vec<ParticipantResult>,
    pub winner: Option<UserBrief>,
}

/// One participant's share of a result posting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub user: UserBrief,
    /// `None` marks a non-reporter, rendered with a distinct notice
    pub report: Option<SubmittedReport>,
    pub photos: Vec<ReportPhoto>,
}

/// Best-effort outward messaging. Failures are logged at the call site and
/// never roll back the state transition that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify a user they were challenged. May return an opaque marker for
    /// the delivered message so it can be edited on invalidation.
    async fn notify_duel_requested(
        &self,
        to_user_id: UserId,
        from_user: &UserBrief,
    ) -> DuelResult<Option<MessageMarker>>;

    async fn notify_request_accepted(
        &self,
        to_user_id: UserId,
        by_user: &UserBrief,
    ) -> DuelResult<()>;

    async fn notify_request_declined(
        &self,
        to_user_id: UserId,
        by_user: &UserBrief,
    ) -> DuelResult<()>;

    /// Tell both parties a pending request expired unanswered
    async fn notify_request_expired(
        &self,
        from_user: &UserBrief,
        to_user: &UserBrief,
    ) -> DuelResult<()>;

    /// Edit a previously delivered request notification to show it is no
    /// longer actionable
    async fn edit_request_invalidated(
        &self,
        to_user_id: UserId,
        marker: MessageMarker,
        from_user: &UserBrief,
    ) -> DuelResult<()>;

    async fn announce_duel(
        &self,
        codeword: &str,
        deadline: DateTime<Utc>,
        user1: &UserBrief,
        user2: &UserBrief,
    ) -> DuelResult<()>;

    async fn announce_weekly_duels(
        &self,
        codeword: &str,
        deadline: DateTime<Utc>,
        groups: &[Vec<PairingCandidate>],
    ) -> DuelResult<()>;

    /// Private preview of a just-submitted report back to its author
    async fn send_report_preview(
        &self,
        user: &UserBrief,
        report: &DuelReport,
        photos: &[ReportPhoto],
    ) -> DuelResult<()>;

    async fn remind_about_report(
        &self,
        user_id: UserId,
        deadline: DateTime<Utc>,
    ) -> DuelResult<()>;

    async fn post_duel_results(&self, results: &DuelResults) -> DuelResult<()>;

    async fn post_monthly_rating(
        &self,
        rating: &[RatingRecord],
        winners: &[RatingRecord],
    ) -> DuelResult<()>;
}

/// Report photo storage keyed by (duel, participant)
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Replace a participant's photo set: the previous set is deleted,
    /// then the new one stored
    async fn replace_report_photos(
        &self,
        duel_id: DuelId,
        user_id: UserId,
        photos: &[ReportPhoto],
    ) -> DuelResult<()>;

    async fn download_report_photos(
        &self,
        duel_id: DuelId,
        user_id: UserId,
    ) -> DuelResult<Vec<ReportPhoto>>;

    /// Delete every photo set belonging to a duel
    async fn delete_duel_photos(&self, duel_id: DuelId) -> DuelResult<()>;
}
