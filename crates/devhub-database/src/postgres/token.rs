//! Token store backed by the `user_tokens` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_entity::user::{NewUserToken, TokenPurpose, UserToken};

use crate::store::TokenStore;

/// PostgreSQL token store.
#[derive(Debug, Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Create a new token store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, data: &NewUserToken) -> AppResult<UserToken> {
        sqlx::query_as::<_, UserToken>(
            "INSERT INTO user_tokens (id, user_id, token, purpose, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(&data.token)
        .bind(data.purpose)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to create token", e))
    }

    async fn find_valid(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserToken>> {
        sqlx::query_as::<_, UserToken>(
            "SELECT * FROM user_tokens WHERE token = $1 AND purpose = $2 AND expires_at > $3",
        )
        .bind(token)
        .bind(purpose)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find token", e))
    }

    async fn find_by_user(&self, user_id: Uuid, purpose: TokenPurpose) -> AppResult<Vec<UserToken>> {
        sqlx::query_as::<_, UserToken>(
            "SELECT * FROM user_tokens WHERE user_id = $1 AND purpose = $2 ORDER BY expires_at DESC",
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to list tokens", e))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM user_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to delete token", e)
            })?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to delete expired tokens",
                    e,
                )
            })?;
        Ok(result.rows_affected())
    }
}
