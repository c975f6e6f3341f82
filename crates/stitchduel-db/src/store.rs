//! [`PgDuelStore`] - the engine's `DuelStore` port over PostgreSQL

use async_trait::async_trait;

use stitchduel_engine::ports::DuelStore;
use stitchduel_types::{
    ActiveDuel, ArchivedDuel, Duel, DuelId, DuelParticipantInfo, DuelReport, DuelRequest,
    DuelRequestId, DuelResult, FullDuel, MessageMarker, PairingCandidate, RatedUser, RatingRecord,
    RemovedRequest, SubmittedReport, UserBrief, UserId,
};

use crate::models::{DbActiveDuelRow, DbArchivedDuelRow, DbFullDuelRow};
use crate::{Database, DbResult};

/// PostgreSQL adapter for the engine's persistence port
pub struct PgDuelStore {
    db: Database,
}

impl PgDuelStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DuelStore for PgDuelStore {
    async fn get_user_brief(&self, user_id: UserId) -> DuelResult<Option<UserBrief>> {
        let brief = self.db.users().find_brief(user_id.0).await?;
        Ok(brief.map(|b| b.into_brief()))
    }

    async fn users_available_for_duel(&self) -> DuelResult<Vec<RatedUser>> {
        let rows = self.db.users().list_available_for_duel().await?;
        collect(rows.into_iter().map(|row| row.into_rated()))
    }

    async fn users_for_weekly_duels(&self) -> DuelResult<Vec<PairingCandidate>> {
        let rows = self.db.users().list_weekly_candidates().await?;
        collect(rows.into_iter().map(|row| row.into_candidate()))
    }

    async fn create_requests(
        &self,
        from_user_id: UserId,
        to_user_ids: &[UserId],
    ) -> DuelResult<Vec<DuelRequest>> {
        let targets: Vec<_> = to_user_ids.iter().map(|id| id.0).collect();
        let created = self
            .db
            .duel_requests()
            .create_many(from_user_id.0, &targets)
            .await?;
        Ok(created.into_iter().map(|row| row.into_request()).collect())
    }

    async fn get_request(&self, id: DuelRequestId) -> DuelResult<Option<DuelRequest>> {
        let request = self.db.duel_requests().find(id.0).await?;
        Ok(request.map(|row| row.into_request()))
    }

    async fn requests_for_user(&self, user_id: UserId) -> DuelResult<Vec<DuelRequest>> {
        let requests = self.db.duel_requests().list_for_user(user_id.0).await?;
        Ok(requests.into_iter().map(|row| row.into_request()).collect())
    }

    async fn set_request_marker(
        &self,
        id: DuelRequestId,
        marker: MessageMarker,
    ) -> DuelResult<()> {
        self.db.duel_requests().set_marker(id.0, marker.0).await?;
        Ok(())
    }

    async fn remove_request(&self, id: DuelRequestId) -> DuelResult<Option<RemovedRequest>> {
        let removed = self.db.duel_requests().delete_returning(id.0).await?;
        Ok(removed.map(|row| row.into_removed()))
    }

    async fn sibling_requests(
        &self,
        from_user_id: UserId,
        exclude: DuelRequestId,
    ) -> DuelResult<Vec<DuelRequest>> {
        let siblings = self
            .db
            .duel_requests()
            .siblings(from_user_id.0, exclude.0)
            .await?;
        Ok(siblings.into_iter().map(|row| row.into_request()).collect())
    }

    async fn user_in_active_duel(
        &self,
        user_id: UserId,
        duel_id: Option<DuelId>,
    ) -> DuelResult<bool> {
        let busy = self
            .db
            .duels()
            .user_in_active_duel(user_id.0, duel_id.map(|id| id.0))
            .await?;
        Ok(busy)
    }

    async fn create_duel(&self, codeword: &str, participants: &[UserId]) -> DuelResult<Duel> {
        let ids: Vec<_> = participants.iter().map(|id| id.0).collect();
        let duel = self.db.duels().create(codeword, &ids).await?;
        Ok(duel.into_duel())
    }

    async fn create_duels_batch(
        &self,
        codeword: &str,
        groups: &[Vec<UserId>],
    ) -> DuelResult<Vec<Duel>> {
        let id_groups: Vec<Vec<_>> = groups
            .iter()
            .map(|group| group.iter().map(|id| id.0).collect())
            .collect();
        let duels = self.db.duels().create_batch(codeword, &id_groups).await?;
        Ok(duels.into_iter().map(|row| row.into_duel()).collect())
    }

    async fn get_duel(&self, id: DuelId) -> DuelResult<Option<Duel>> {
        let duel = self.db.duels().find(id.0).await?;
        Ok(duel.map(|row| row.into_duel()))
    }

    async fn get_full_duel(&self, id: DuelId) -> DuelResult<Option<FullDuel>> {
        let rows = self.db.duels().full_info_rows(id.0).await?;
        Ok(fold_full_duel(rows))
    }

    async fn active_duels(&self) -> DuelResult<Vec<ActiveDuel>> {
        let rows = self.db.duels().active_rows().await?;
        Ok(fold_active_duels(rows)?)
    }

    async fn completed_duels_by_month(
        &self,
        year: i32,
        month: u32,
    ) -> DuelResult<Vec<ArchivedDuel>> {
        let rows = self.db.duels().completed_by_month_rows(year, month).await?;
        Ok(fold_archived_duels(rows))
    }

    async fn complete_duel(&self, id: DuelId, winner: Option<UserId>) -> DuelResult<bool> {
        let completed = self
            .db
            .duels()
            .complete(id.0, winner.map(|w| w.0))
            .await?;
        Ok(completed)
    }

    async fn upsert_report(
        &self,
        duel_id: DuelId,
        user_id: UserId,
        stitches: u32,
        note: Option<&str>,
    ) -> DuelResult<DuelReport> {
        let report = self
            .db
            .duel_reports()
            .upsert(duel_id.0, user_id.0, stitches as i32, note)
            .await?;
        Ok(report.into_report())
    }

    async fn get_report(
        &self,
        duel_id: DuelId,
        user_id: UserId,
    ) -> DuelResult<Option<DuelReport>> {
        let report = self.db.duel_reports().find(duel_id.0, user_id.0).await?;
        Ok(report.map(|row| row.into_report()))
    }

    async fn current_rating(&self) -> DuelResult<Vec<RatingRecord>> {
        let rows = self.db.rating().current().await?;
        collect(rows.into_iter().map(|row| row.into_record()))
    }

    async fn previous_month_rating(&self) -> DuelResult<Vec<RatingRecord>> {
        let rows = self.db.rating().previous_month().await?;
        collect(rows.into_iter().map(|row| row.into_record()))
    }

    async fn refresh_rating(&self) -> DuelResult<()> {
        self.db.rating().refresh().await?;
        Ok(())
    }
}

fn collect<T>(rows: impl Iterator<Item = DbResult<T>>) -> DuelResult<Vec<T>> {
    rows.map(|row| row.map_err(Into::into)).collect()
}

fn fold_full_duel(rows: Vec<DbFullDuelRow>) -> Option<FullDuel> {
    let first = rows.first()?;
    let mut duel = FullDuel {
        id: DuelId(first.id),
        codeword: first.codeword.clone(),
        started_at: first.started_at,
        completed_at: first.completed_at,
        participants: Vec::with_capacity(rows.len()),
    };
    for row in rows {
        duel.participants.push(DuelParticipantInfo {
            user: UserBrief {
                id: UserId(row.user_id),
                fullname: row.fullname,
            },
            report: row.stitches.map(|stitches| SubmittedReport {
                stitches: stitches.max(0) as u32,
                note: row.note,
            }),
        });
    }
    Some(duel)
}

fn fold_active_duels(rows: Vec<DbActiveDuelRow>) -> DbResult<Vec<ActiveDuel>> {
    let mut duels: Vec<ActiveDuel> = Vec::new();
    for row in rows {
        let participant = RatedUser {
            id: UserId(row.user_id),
            tier: crate::models::parse_tier(&row.skill_tier)?,
            fullname: row.fullname,
            photo_url: row.photo_url,
        };
        match duels.last_mut() {
            Some(duel) if duel.id.0 == row.id => duel.participants.push(participant),
            _ => duels.push(ActiveDuel {
                id: DuelId(row.id),
                codeword: row.codeword,
                started_at: row.started_at,
                participants: vec![participant],
            }),
        }
    }
    Ok(duels)
}

fn fold_archived_duels(rows: Vec<DbArchivedDuelRow>) -> Vec<ArchivedDuel> {
    let mut duels: Vec<ArchivedDuel> = Vec::new();
    for row in rows {
        match duels.last_mut() {
            Some(duel) if duel.id.0 == row.id => duel.participant_ids.push(UserId(row.user_id)),
            _ => duels.push(ArchivedDuel {
                id: DuelId(row.id),
                codeword: row.codeword,
                completed_at: row.completed_at,
                winner_id: row.winner_id.map(UserId),
                participant_ids: vec![UserId(row.user_id)],
            }),
        }
    }
    duels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_fold_full_duel_aligns_reports_with_participants() {
        let duel_id = Uuid::new_v4();
        let reporter = Uuid::new_v4();
        let silent = Uuid::new_v4();
        let rows = vec![
            DbFullDuelRow {
                id: duel_id,
                codeword: "gusset".to_string(),
                started_at: Utc::now(),
                completed_at: None,
                user_id: reporter,
                fullname: "alice".to_string(),
                stitches: Some(12),
                note: Some("done".to_string()),
            },
            DbFullDuelRow {
                id: duel_id,
                codeword: "gusset".to_string(),
                started_at: Utc::now(),
                completed_at: None,
                user_id: silent,
                fullname: "bob".to_string(),
                stitches: None,
                note: None,
            },
        ];

        let duel = fold_full_duel(rows).unwrap();
        assert_eq!(duel.participants.len(), 2);
        assert_eq!(
            duel.participant(UserId(reporter)).unwrap().report,
            Some(SubmittedReport {
                stitches: 12,
                note: Some("done".to_string())
            })
        );
        assert!(duel.participant(UserId(silent)).unwrap().report.is_none());
    }

    #[test]
    fn test_fold_full_duel_empty_rows() {
        assert!(fold_full_duel(Vec::new()).is_none());
    }

    #[test]
    fn test_fold_active_duels_groups_rows() {
        let duel_a = Uuid::new_v4();
        let duel_b = Uuid::new_v4();
        let row = |duel: Uuid, name: &str| DbActiveDuelRow {
            id: duel,
            codeword: "cable".to_string(),
            started_at: Utc::now(),
            user_id: Uuid::new_v4(),
            fullname: name.to_string(),
            photo_url: None,
            skill_tier: "novice".to_string(),
        };
        let duels = fold_active_duels(vec![
            row(duel_a, "alice"),
            row(duel_a, "bob"),
            row(duel_b, "carol"),
            row(duel_b, "dave"),
        ])
        .unwrap();

        assert_eq!(duels.len(), 2);
        assert!(duels.iter().all(|duel| duel.participants.len() == 2));
    }
}
