//! User repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DbPairingCandidate, DbRatedUser, DbUser, DbUserBrief};
use crate::DbResult;

pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        id: Uuid,
        fullname: &str,
        photo_url: Option<&str>,
        skill_tier: &str,
        weekly_duels_opt_in: bool,
    ) -> DbResult<DbUser> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, fullname, photo_url, skill_tier, weekly_duels_opt_in)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fullname)
        .bind(photo_url)
        .bind(skill_tier)
        .bind(weekly_duels_opt_in)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find(&self, id: Uuid) -> DbResult<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_brief(&self, id: Uuid) -> DbResult<Option<DbUserBrief>> {
        let brief =
            sqlx::query_as::<_, DbUserBrief>("SELECT id, fullname FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(brief)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_weekly_opt_in(&self, id: Uuid, opt_in: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET weekly_duels_opt_in = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(opt_in)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Active users not currently participating in an active duel
    pub async fn list_available_for_duel(&self) -> DbResult<Vec<DbRatedUser>> {
        let users = sqlx::query_as::<_, DbRatedUser>(
            r#"
            SELECT u.id, u.fullname, u.photo_url, u.skill_tier
            FROM users AS u
            WHERE u.active AND NOT EXISTS (
                SELECT
                FROM duel_participants AS dp
                JOIN duels AS d ON d.id = dp.duel_id
                WHERE dp.user_id = u.id AND d.completed_at IS NULL
            )
            ORDER BY u.fullname
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Active, opted-in users not currently in an active duel
    pub async fn list_weekly_candidates(&self) -> DbResult<Vec<DbPairingCandidate>> {
        let users = sqlx::query_as::<_, DbPairingCandidate>(
            r#"
            SELECT u.id, u.fullname, u.skill_tier
            FROM users AS u
            WHERE u.active
              AND u.weekly_duels_opt_in
              AND NOT EXISTS (
                SELECT
                FROM duel_participants AS dp
                JOIN duels AS d ON d.id = dp.duel_id
                WHERE dp.user_id = u.id AND d.completed_at IS NULL
            )
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
