//! Rating repository
//!
//! The current-period rating reads from the `duels_rating` materialized
//! view; the previous-month rating aggregates straight from the duel
//! archive so it stays correct across the month boundary.

use sqlx::PgPool;

use crate::models::DbRatingRow;
use crate::DbResult;

pub struct RatingRepo {
    pool: PgPool,
}

impl RatingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current-period counts per active user, unordered
    pub async fn current(&self) -> DbResult<Vec<DbRatingRow>> {
        let rows = sqlx::query_as::<_, DbRatingRow>(
            r#"
            SELECT
                dr.user_id,
                u.fullname,
                u.photo_url,
                u.skill_tier,
                dr.total_duels_won,
                dr.total_duels_participated
            FROM duels_rating AS dr
            JOIN users AS u ON u.id = dr.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Prior-calendar-month counts from completed duels and recorded
    /// winners; zero-activity users excluded; ordered by wins then
    /// participation, both descending
    pub async fn previous_month(&self) -> DbResult<Vec<DbRatingRow>> {
        let rows = sqlx::query_as::<_, DbRatingRow>(
            r#"
            WITH
            monthly_participation AS (
                SELECT dp.user_id, COUNT(dp.duel_id) AS total
                FROM duel_participants AS dp
                JOIN duels AS d ON dp.duel_id = d.id
                WHERE d.completed_at >= date_trunc('month', NOW()) - INTERVAL '1 month'
                  AND d.completed_at < date_trunc('month', NOW())
                GROUP BY dp.user_id
            ),
            monthly_wins AS (
                SELECT dw.user_id, COUNT(dw.duel_id) AS total
                FROM duel_winners AS dw
                JOIN duels AS d ON dw.duel_id = d.id
                WHERE d.completed_at >= date_trunc('month', NOW()) - INTERVAL '1 month'
                  AND d.completed_at < date_trunc('month', NOW())
                GROUP BY dw.user_id
            )
            SELECT
                u.id AS user_id,
                u.fullname,
                u.photo_url,
                u.skill_tier,
                COALESCE(mw.total, 0) AS total_duels_won,
                COALESCE(mp.total, 0) AS total_duels_participated
            FROM users AS u
            LEFT JOIN monthly_participation AS mp ON u.id = mp.user_id
            LEFT JOIN monthly_wins AS mw ON u.id = mw.user_id
            WHERE u.active
              AND (mp.total > 0 OR mw.total > 0)
            ORDER BY total_duels_won DESC, total_duels_participated DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Refresh the materialized view backing the current-period rating
    pub async fn refresh(&self) -> DbResult<()> {
        sqlx::query("REFRESH MATERIALIZED VIEW duels_rating")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
