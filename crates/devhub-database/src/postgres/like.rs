//! Like store backed by the `likes` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_entity::like::{Like, star_delta};

use crate::store::LikeStore;

/// PostgreSQL like store.
#[derive(Debug, Clone)]
pub struct PgLikeStore {
    pool: PgPool,
}

impl PgLikeStore {
    /// Create a new like store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeStore for PgLikeStore {
    async fn find(&self, user_id: Uuid, repository_id: Uuid) -> AppResult<Option<Like>> {
        sqlx::query_as::<_, Like>("SELECT * FROM likes WHERE user_id = $1 AND repository_id = $2")
            .bind(user_id)
            .bind(repository_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find like", e))
    }

    async fn toggle(&self, user_id: Uuid, repository_id: Uuid, plus: bool) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to begin transaction", e)
        })?;

        // The repository row lock serializes concurrent votes on it.
        let stars: Option<i64> =
            sqlx::query_scalar("SELECT stars FROM repositories WHERE id = $1 FOR UPDATE")
                .bind(repository_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to lock repository", e)
                })?;
        let Some(stars) = stars else {
            return Err(AppError::not_found(format!(
                "Repository {repository_id} not found"
            )));
        };

        let previous: Option<bool> = sqlx::query_scalar(
            "SELECT plus FROM likes WHERE user_id = $1 AND repository_id = $2",
        )
        .bind(user_id)
        .bind(repository_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find like", e))?;

        let delta = star_delta(previous, plus);
        if delta == 0 {
            return Ok(stars);
        }

        sqlx::query(
            "INSERT INTO likes (user_id, repository_id, plus) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, repository_id) DO UPDATE SET plus = EXCLUDED.plus",
        )
        .bind(user_id)
        .bind(repository_id)
        .bind(plus)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to save like", e))?;

        let stars: i64 = sqlx::query_scalar(
            "UPDATE repositories SET stars = stars + $2 WHERE id = $1 RETURNING stars",
        )
        .bind(repository_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to update stars", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to commit like", e)
        })?;
        Ok(stars)
    }
}
