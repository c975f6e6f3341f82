//! Duel report repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DbDuelReport;
use crate::DbResult;

pub struct DuelReportRepo {
    pool: PgPool,
}

impl DuelReportRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the (duel, user) report row
    pub async fn upsert(
        &self,
        duel_id: Uuid,
        user_id: Uuid,
        stitches: i32,
        note: Option<&str>,
    ) -> DbResult<DbDuelReport> {
        let report = sqlx::query_as::<_, DbDuelReport>(
            r#"
            INSERT INTO duel_reports (duel_id, user_id, stitches, note)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (duel_id, user_id) DO UPDATE
            SET stitches = EXCLUDED.stitches,
                note = EXCLUDED.note,
                submitted_at = NOW()
            RETURNING *
            "#,
        )
        .bind(duel_id)
        .bind(user_id)
        .bind(stitches)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn find(&self, duel_id: Uuid, user_id: Uuid) -> DbResult<Option<DbDuelReport>> {
        let report = sqlx::query_as::<_, DbDuelReport>(
            "SELECT * FROM duel_reports WHERE duel_id = $1 AND user_id = $2",
        )
        .bind(duel_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn list_by_duel(&self, duel_id: Uuid) -> DbResult<Vec<DbDuelReport>> {
        let reports =
            sqlx::query_as::<_, DbDuelReport>("SELECT * FROM duel_reports WHERE duel_id = $1")
                .bind(duel_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(reports)
    }
}
