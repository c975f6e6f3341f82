//! Duel request repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DbDuelRequest, DbRemovedRequest};
use crate::DbResult;

pub struct DuelRequestRepo {
    pool: PgPool,
}

impl DuelRequestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bulk insert one pending request per target. The unique
    /// (from_user_id, to_user_id) constraint silently drops duplicates;
    /// only the rows actually created come back.
    pub async fn create_many(
        &self,
        from_user_id: Uuid,
        to_user_ids: &[Uuid],
    ) -> DbResult<Vec<DbDuelRequest>> {
        let ids: Vec<Uuid> = to_user_ids.iter().map(|_| Uuid::new_v4()).collect();
        let from_ids: Vec<Uuid> = to_user_ids.iter().map(|_| from_user_id).collect();

        let created = sqlx::query_as::<_, DbDuelRequest>(
            r#"
            INSERT INTO duel_requests (id, from_user_id, to_user_id)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[])
            ON CONFLICT (from_user_id, to_user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&ids)
        .bind(&from_ids)
        .bind(to_user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn find(&self, id: Uuid) -> DbResult<Option<DbDuelRequest>> {
        let request =
            sqlx::query_as::<_, DbDuelRequest>("SELECT * FROM duel_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    /// Pending requests addressed to a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<DbDuelRequest>> {
        let requests = sqlx::query_as::<_, DbDuelRequest>(
            "SELECT * FROM duel_requests WHERE to_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    pub async fn set_marker(&self, id: Uuid, marker: i64) -> DbResult<()> {
        sqlx::query("UPDATE duel_requests SET message_marker = $2 WHERE id = $1")
            .bind(id)
            .bind(marker)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Atomically delete a request, returning the party briefs it carried.
    /// Concurrent callers race on the DELETE; only one gets the row.
    pub async fn delete_returning(&self, id: Uuid) -> DbResult<Option<DbRemovedRequest>> {
        let removed = sqlx::query_as::<_, DbRemovedRequest>(
            r#"
            DELETE FROM duel_requests AS dr
            USING users AS fu, users AS tu
            WHERE dr.id = $1
              AND fu.id = dr.from_user_id
              AND tu.id = dr.to_user_id
            RETURNING
                dr.id,
                dr.message_marker,
                fu.id AS from_user_id,
                fu.fullname AS from_fullname,
                tu.id AS to_user_id,
                tu.fullname AS to_fullname
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(removed)
    }

    /// Other pending requests from the same sender
    pub async fn siblings(
        &self,
        from_user_id: Uuid,
        exclude: Uuid,
    ) -> DbResult<Vec<DbDuelRequest>> {
        let requests = sqlx::query_as::<_, DbDuelRequest>(
            "SELECT * FROM duel_requests WHERE from_user_id = $1 AND id != $2",
        )
        .bind(from_user_id)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }
}
