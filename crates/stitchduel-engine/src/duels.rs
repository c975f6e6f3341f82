//! The duel state machine
//!
//! A duel moves `NoDuel → Active → Completed`, one-directional and terminal
//! at `Completed`. [`DuelEngine`] owns every transition: creation from an
//! accepted request, the weekly batch draw, report submission while active,
//! and the deadline completion that determines the winner.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use stitchduel_domain::{pair_users, random_codeword, DuelConfig};
use stitchduel_types::{
    ActiveDuelWithDeadline, ArchivedDuel, Duel, DuelError, DuelId, DuelReportDraft, DuelResult,
    RatedUser, ScheduledTask, UserBrief, UserId,
};

use crate::ports::{DuelResults, DuelStore, MediaStore, Notifier, ParticipantResult, TaskScheduler};

/// Longest accepted free-text note on a report
const MAX_REPORT_NOTE_LEN: usize = 1000;
/// Most photos accepted per report
const MAX_REPORT_PHOTOS: usize = 10;

/// The duel lifecycle state machine
pub struct DuelEngine {
    store: Arc<dyn DuelStore>,
    scheduler: Arc<dyn TaskScheduler>,
    notifier: Arc<dyn Notifier>,
    media: Arc<dyn MediaStore>,
    config: DuelConfig,
    /// Injected random source for codeword picks and winner tie-breaks;
    /// tests seed it for deterministic outcomes
    rng: Mutex<StdRng>,
}

impl DuelEngine {
    pub fn new(
        store: Arc<dyn DuelStore>,
        scheduler: Arc<dyn TaskScheduler>,
        notifier: Arc<dyn Notifier>,
        media: Arc<dyn MediaStore>,
        config: DuelConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            scheduler,
            notifier,
            media,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Create a duel between two users.
    ///
    /// The store re-verifies inside its transaction that neither user is
    /// already in an active duel; callers translate the resulting
    /// [`DuelError::UserAlreadyInDuel`] for their context.
    pub async fn create_duel(&self, user1: &UserBrief, user2: &UserBrief) -> DuelResult<Duel> {
        let codeword = self.pick_codeword();
        let duel = self
            .store
            .create_duel(codeword, &[user1.id, user2.id])
            .await?;
        let deadline = self.config.deadline_for(duel.started_at);

        info!(duel_id = %duel.id, codeword, "duel created");

        if let Err(err) = self
            .notifier
            .announce_duel(codeword, deadline, user1, user2)
            .await
        {
            warn!(duel_id = %duel.id, %err, "failed to announce duel");
        }

        self.schedule_completion(duel.id, 0).await?;
        self.schedule_reminders(duel.id, &[user1.id, user2.id]).await?;

        Ok(duel)
    }

    /// Draw and create the weekly random duel batch.
    pub async fn create_weekly_random_duels(&self) -> DuelResult<Vec<Duel>> {
        let candidates = self.store.users_for_weekly_duels().await?;
        let groups = {
            let mut rng = self.rng.lock();
            pair_users(&candidates, &mut *rng)?
        };

        let codeword = self.pick_codeword();
        let id_groups: Vec<Vec<UserId>> = groups
            .iter()
            .map(|group| group.iter().map(|user| user.id).collect())
            .collect();
        let duels = self.store.create_duels_batch(codeword, &id_groups).await?;

        info!(count = duels.len(), codeword, "weekly random duels created");

        let deadline = match duels.first() {
            Some(first) => self.config.deadline_for(first.started_at),
            None => return Ok(duels),
        };

        if let Err(err) = self
            .notifier
            .announce_weekly_duels(codeword, deadline, &groups)
            .await
        {
            warn!(%err, "failed to announce weekly random duels");
        }

        for (index, (duel, group)) in duels.iter().zip(&groups).enumerate() {
            self.schedule_completion(duel.id, index as u32).await?;
            let member_ids: Vec<UserId> = group.iter().map(|user| user.id).collect();
            self.schedule_reminders(duel.id, &member_ids).await?;
        }

        Ok(duels)
    }

    /// Submit (or resubmit) a participant's report for an active duel.
    pub async fn create_duel_report(
        &self,
        duel_id: DuelId,
        user_id: UserId,
        draft: DuelReportDraft,
    ) -> DuelResult<()> {
        validate_report(&draft)?;

        let duel = self
            .store
            .get_full_duel(duel_id)
            .await?
            .ok_or(DuelError::DuelNotFound(duel_id))?;
        let participant = duel.participant(user_id).ok_or(DuelError::NotAllowed)?;
        if !duel.is_active() {
            return Err(DuelError::DuelNotActive(duel_id));
        }
        let user = participant.user.clone();

        let report = self
            .store
            .upsert_report(duel_id, user_id, draft.stitches, draft.note.as_deref())
            .await?;

        if let Err(err) = self
            .media
            .replace_report_photos(duel_id, user_id, &draft.photos)
            .await
        {
            warn!(%duel_id, %user_id, %err, "failed to store report photos");
        }

        if let Err(err) = self
            .notifier
            .send_report_preview(&user, &report, &draft.photos)
            .await
        {
            warn!(%duel_id, %user_id, %err, "failed to send report preview");
        }

        Ok(())
    }

    /// Complete a duel: determine the winner, persist the outcome, post
    /// the results and clean up media.
    ///
    /// Idempotent — a missing or already-completed duel is a no-op, so
    /// duplicate scheduled callbacks are harmless.
    pub async fn complete_duel(&self, duel_id: DuelId) -> DuelResult<()> {
        let duel = match self.store.get_full_duel(duel_id).await? {
            Some(duel) if duel.is_active() => duel,
            _ => {
                debug!(%duel_id, "completion skipped: duel missing or already completed");
                return Ok(());
            }
        };

        let winner = self.select_winner(&duel.participants);

        // First writer wins; a concurrent completion already posted.
        if !self
            .store
            .complete_duel(duel_id, winner.as_ref().map(|w| w.id))
            .await?
        {
            debug!(%duel_id, "completion lost the race to a concurrent callback");
            return Ok(());
        }

        info!(
            %duel_id,
            winner = winner.as_ref().map(|w| w.fullname.as_str()).unwrap_or("none"),
            "duel completed"
        );

        self.store.refresh_rating().await?;

        let mut participants = Vec::with_capacity(duel.participants.len());
        for info in &duel.participants {
            let photos = match self
                .media
                .download_report_photos(duel_id, info.user.id)
                .await
            {
                Ok(photos) => photos,
                Err(err) => {
                    warn!(%duel_id, user_id = %info.user.id, %err, "failed to download report photos");
                    Vec::new()
                }
            };
            participants.push(ParticipantResult {
                user: info.user.clone(),
                report: info.report.clone(),
                photos,
            });
        }

        let results = DuelResults {
            duel_id,
            codeword: duel.codeword.clone(),
            participants,
            winner,
        };
        if let Err(err) = self.notifier.post_duel_results(&results).await {
            warn!(%duel_id, %err, "failed to post duel results");
        }

        if let Err(err) = self.media.delete_duel_photos(duel_id).await {
            warn!(%duel_id, %err, "failed to delete duel media");
        }

        Ok(())
    }

    /// Remind a participant about their missing report.
    ///
    /// Idempotent — no-op when the report exists or the duel is gone.
    pub async fn send_duel_report_reminder(
        &self,
        duel_id: DuelId,
        user_id: UserId,
    ) -> DuelResult<()> {
        if self.store.get_report(duel_id, user_id).await?.is_some() {
            return Ok(());
        }
        let duel = match self.store.get_duel(duel_id).await? {
            Some(duel) if duel.is_active() => duel,
            _ => return Ok(()),
        };

        let deadline = self.config.deadline_for(duel.started_at);
        if let Err(err) = self.notifier.remind_about_report(user_id, deadline).await {
            warn!(%duel_id, %user_id, %err, "failed to send report reminder");
        }
        Ok(())
    }

    // ── Read side ────────────────────────────────────────────────────────

    /// A duel with its participants and reports
    pub async fn full_duel(&self, duel_id: DuelId) -> DuelResult<stitchduel_types::FullDuel> {
        self.store
            .get_full_duel(duel_id)
            .await?
            .ok_or(DuelError::DuelNotFound(duel_id))
    }

    /// Whether a user participates in an active duel (a specific one, or
    /// any when `duel_id` is `None`)
    pub async fn user_participates(
        &self,
        user_id: UserId,
        duel_id: Option<DuelId>,
    ) -> DuelResult<bool> {
        self.store.user_in_active_duel(user_id, duel_id).await
    }

    /// Active duels with their deadlines resolved
    pub async fn active_duels(&self) -> DuelResult<Vec<ActiveDuelWithDeadline>> {
        let duels = self.store.active_duels().await?;
        Ok(duels
            .into_iter()
            .map(|duel| ActiveDuelWithDeadline {
                id: duel.id,
                codeword: duel.codeword,
                deadline: self.config.deadline_for(duel.started_at),
                participants: duel.participants,
            })
            .collect())
    }

    /// Completed duels for a given month, newest first
    pub async fn archived_duels(&self, year: i32, month: u32) -> DuelResult<Vec<ArchivedDuel>> {
        self.store.completed_duels_by_month(year, month).await
    }

    /// Users currently available as opponents, excluding the asker
    pub async fn available_opponents(
        &self,
        exclude_user_id: Option<UserId>,
    ) -> DuelResult<Vec<RatedUser>> {
        let users = self.store.users_available_for_duel().await?;
        Ok(users
            .into_iter()
            .filter(|user| Some(user.id) != exclude_user_id)
            .collect())
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn pick_codeword(&self) -> &'static str {
        let mut rng = self.rng.lock();
        random_codeword(&mut *rng)
    }

    /// Winner = the participant with the strictly highest stitches count
    /// among positive reports; uniform-random among ties; `None` when no
    /// report is positive.
    fn select_winner(
        &self,
        participants: &[stitchduel_types::DuelParticipantInfo],
    ) -> Option<UserBrief> {
        let positive: Vec<(&UserBrief, u32)> = participants
            .iter()
            .filter_map(|info| {
                info.report
                    .as_ref()
                    .filter(|report| report.stitches > 0)
                    .map(|report| (&info.user, report.stitches))
            })
            .collect();
        let best = positive.iter().map(|(_, stitches)| *stitches).max()?;
        let contenders: Vec<&UserBrief> = positive
            .iter()
            .filter(|(_, stitches)| *stitches == best)
            .map(|(user, _)| *user)
            .collect();

        let mut rng = self.rng.lock();
        contenders.choose(&mut *rng).map(|user| (*user).clone())
    }

    async fn schedule_completion(&self, duel_id: DuelId, batch_index: u32) -> DuelResult<()> {
        let delay = self.config.duel_period + batch_index * self.config.completion_stagger;
        debug!(%duel_id, ?delay, "scheduling duel completion");
        self.scheduler
            .schedule(ScheduledTask::CompleteDuel { duel_id }, delay)
            .await
    }

    async fn schedule_reminders(&self, duel_id: DuelId, participants: &[UserId]) -> DuelResult<()> {
        for &user_id in participants {
            for &offset in &self.config.report_reminder_offsets {
                self.scheduler
                    .schedule(ScheduledTask::RemindDuelReport { duel_id, user_id }, offset)
                    .await?;
            }
        }
        Ok(())
    }
}

fn validate_report(draft: &DuelReportDraft) -> DuelResult<()> {
    if let Some(note) = &draft.note {
        if note.len() > MAX_REPORT_NOTE_LEN {
            return Err(DuelError::Validation(format!(
                "report note exceeds {MAX_REPORT_NOTE_LEN} characters"
            )));
        }
    }
    if draft.photos.len() > MAX_REPORT_PHOTOS {
        return Err(DuelError::Validation(format!(
            "at most {MAX_REPORT_PHOTOS} photos per report"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitchduel_types::ReportPhoto;

    #[test]
    fn test_validate_report_limits() {
        let ok = DuelReportDraft {
            stitches: 12,
            note: Some("steady progress".to_string()),
            photos: vec![],
        };
        assert!(validate_report(&ok).is_ok());

        let long_note = DuelReportDraft {
            stitches: 12,
            note: Some("x".repeat(MAX_REPORT_NOTE_LEN + 1)),
            photos: vec![],
        };
        assert!(matches!(
            validate_report(&long_note),
            Err(DuelError::Validation(_))
        ));

        let too_many_photos = DuelReportDraft {
            stitches: 12,
            note: None,
            photos: (0..=MAX_REPORT_PHOTOS)
                .map(|_| ReportPhoto {
                    content_type: "image/jpeg".to_string(),
                    bytes: vec![0u8; 4],
                })
                .collect(),
        };
        assert!(matches!(
            validate_report(&too_many_photos),
            Err(DuelError::Validation(_))
        ));
    }
}
