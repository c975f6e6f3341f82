//! Duel repository
//!
//! Duel creation is the invariant-bearing write: the "no participant is
//! already in an active duel" check runs inside the same transaction as
//! the insert, serialized per user with advisory transaction locks, so two
//! concurrent accepts cannot place one user in two duels.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{DbActiveDuelRow, DbArchivedDuelRow, DbDuel, DbFullDuelRow};
use crate::DbResult;

pub struct DuelRepo {
    pool: PgPool,
}

impl DuelRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> DbResult<Option<DbDuel>> {
        let duel = sqlx::query_as::<_, DbDuel>(
            r#"
            SELECT d.id, d.codeword, d.started_at, d.completed_at, dw.user_id AS winner_id
            FROM duels AS d
            LEFT JOIN duel_winners AS dw ON dw.duel_id = d.id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(duel)
    }

    /// One row per participant, with their report columns when present
    pub async fn full_info_rows(&self, id: Uuid) -> DbResult<Vec<DbFullDuelRow>> {
        let rows = sqlx::query_as::<_, DbFullDuelRow>(
            r#"
            SELECT
                d.id, d.codeword, d.started_at, d.completed_at,
                u.id AS user_id, u.fullname,
                dr.stitches, dr.note
            FROM duels AS d
            INNER JOIN duel_participants AS dp ON dp.duel_id = d.id
            INNER JOIN users AS u ON u.id = dp.user_id
            LEFT JOIN duel_reports AS dr ON dr.duel_id = d.id AND dr.user_id = u.id
            WHERE d.id = $1
            ORDER BY u.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One row per participant of each active duel, newest duel first
    pub async fn active_rows(&self) -> DbResult<Vec<DbActiveDuelRow>> {
        let rows = sqlx::query_as::<_, DbActiveDuelRow>(
            r#"
            SELECT
                d.id, d.codeword, d.started_at,
                u.id AS user_id, u.fullname, u.photo_url, u.skill_tier
            FROM duels AS d
            JOIN duel_participants AS dp ON dp.duel_id = d.id
            JOIN users AS u ON u.id = dp.user_id
            WHERE d.completed_at IS NULL
            ORDER BY d.started_at DESC, d.id, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One row per participant of each duel completed in the given month
    pub async fn completed_by_month_rows(
        &self,
        year: i32,
        month: u32,
    ) -> DbResult<Vec<DbArchivedDuelRow>> {
        let rows = sqlx::query_as::<_, DbArchivedDuelRow>(
            r#"
            SELECT
                d.id, d.codeword, d.completed_at,
                dw.user_id AS winner_id,
                dp.user_id
            FROM duels AS d
            JOIN duel_participants AS dp ON dp.duel_id = d.id
            LEFT JOIN duel_winners AS dw ON dw.duel_id = d.id
            WHERE d.completed_at IS NOT NULL
              AND EXTRACT(YEAR FROM d.completed_at) = $1
              AND EXTRACT(MONTH FROM d.completed_at) = $2
            ORDER BY d.completed_at DESC, d.id, dp.user_id
            "#,
        )
        .bind(year)
        .bind(month as i32)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_in_active_duel(
        &self,
        user_id: Uuid,
        duel_id: Option<Uuid>,
    ) -> DbResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT
                FROM duel_participants AS dp
                JOIN duels AS d ON d.id = dp.duel_id
                WHERE dp.user_id = $1
                  AND d.completed_at IS NULL
                  AND ($2::uuid IS NULL OR d.id = $2)
            )
            "#,
        )
        .bind(user_id)
        .bind(duel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Create one duel with its participants, verifying in-transaction
    /// that none of them is already in an active duel.
    pub async fn create(&self, codeword: &str, participants: &[Uuid]) -> DbResult<DbDuel> {
        let mut tx = self.pool.begin().await?;
        lock_participants(&mut tx, participants).await?;
        ensure_not_busy(&mut tx, participants).await?;
        let duel = insert_duel(&mut tx, codeword, participants).await?;
        tx.commit().await?;
        Ok(duel)
    }

    /// Create the whole weekly batch in one transaction, sharing a codeword
    pub async fn create_batch(
        &self,
        codeword: &str,
        groups: &[Vec<Uuid>],
    ) -> DbResult<Vec<DbDuel>> {
        let all_participants: Vec<Uuid> = groups.iter().flatten().copied().collect();

        let mut tx = self.pool.begin().await?;
        lock_participants(&mut tx, &all_participants).await?;
        ensure_not_busy(&mut tx, &all_participants).await?;
        let mut duels = Vec::with_capacity(groups.len());
        for group in groups {
            duels.push(insert_duel(&mut tx, codeword, group).await?);
        }
        tx.commit().await?;
        Ok(duels)
    }

    /// Set the completion timestamp and winner, exactly once.
    ///
    /// Returns `false` when another caller completed the duel first; the
    /// winner stays whatever that caller wrote.
    pub async fn complete(&self, id: Uuid, winner: Option<Uuid>) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE duels SET completed_at = NOW() WHERE id = $1 AND completed_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(winner_id) = winner {
            sqlx::query(
                r#"
                INSERT INTO duel_winners (duel_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(winner_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// Serialize concurrent duel creation per participant. Lock keys are
/// derived from the user uuid; ordering them avoids lock cycles.
async fn lock_participants(
    tx: &mut Transaction<'_, Postgres>,
    participants: &[Uuid],
) -> DbResult<()> {
    let mut keys: Vec<i64> = participants
        .iter()
        .map(|id| id.as_u64_pair().0 as i64)
        .collect();
    keys.sort_unstable();
    keys.dedup();
    for key in keys {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn ensure_not_busy(
    tx: &mut Transaction<'_, Postgres>,
    participants: &[Uuid],
) -> DbResult<()> {
    let busy: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT dp.user_id
        FROM duel_participants AS dp
        JOIN duels AS d ON d.id = dp.duel_id
        WHERE d.completed_at IS NULL AND dp.user_id = ANY($1)
        LIMIT 1
        "#,
    )
    .bind(participants)
    .fetch_optional(&mut **tx)
    .await?;

    match busy {
        Some((user_id,)) => Err(DbError::ParticipantBusy(user_id)),
        None => Ok(()),
    }
}

async fn insert_duel(
    tx: &mut Transaction<'_, Postgres>,
    codeword: &str,
    participants: &[Uuid],
) -> DbResult<DbDuel> {
    let duel_id = Uuid::new_v4();
    let row = sqlx::query_as::<_, DbDuel>(
        r#"
        INSERT INTO duels (id, codeword)
        VALUES ($1, $2)
        RETURNING id, codeword, started_at, completed_at, NULL::uuid AS winner_id
        "#,
    )
    .bind(duel_id)
    .bind(codeword)
    .fetch_one(&mut **tx)
    .await?;

    let duel_ids: Vec<Uuid> = participants.iter().map(|_| duel_id).collect();
    sqlx::query(
        r#"
        INSERT INTO duel_participants (duel_id, user_id)
        SELECT * FROM UNNEST($1::uuid[], $2::uuid[])
        "#,
    )
    .bind(&duel_ids)
    .bind(participants)
    .execute(&mut **tx)
    .await?;

    Ok(row)
}
