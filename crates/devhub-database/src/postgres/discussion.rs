//! Discussion store backed by the `discussions` table.

use async_trait::async_trait;
use sqlx::PgPool;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_core::types::PageRequest;
use devhub_entity::discussion::Discussion;

use super::{contains_pattern, violates};
use crate::store::{DiscussionQuery, DiscussionStore};

/// PostgreSQL discussion store.
#[derive(Debug, Clone)]
pub struct PgDiscussionStore {
    pool: PgPool,
}

impl PgDiscussionStore {
    /// Create a new discussion store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscussionStore for PgDiscussionStore {
    async fn insert(&self, discussion: &Discussion) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO discussions \
                (id, code, title, text, snippet, tags, owner_id, repository_id, image, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(discussion.id)
        .bind(&discussion.code)
        .bind(&discussion.title)
        .bind(&discussion.text)
        .bind(discussion.snippet.as_deref())
        .bind(&discussion.tags)
        .bind(discussion.owner_id)
        .bind(discussion.repository_id)
        .bind(discussion.image.as_deref())
        .bind(discussion.created_at)
        .bind(discussion.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "discussions_code_key") {
                AppError::conflict("Discussion code already in use")
            } else {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to create discussion",
                    e,
                )
            }
        })?;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Discussion>> {
        sqlx::query_as::<_, Discussion>("SELECT * FROM discussions WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find discussion", e)
            })
    }

    async fn list(
        &self,
        query: &DiscussionQuery,
        page: &PageRequest,
    ) -> AppResult<Vec<Discussion>> {
        sqlx::query_as::<_, Discussion>(
            "SELECT * FROM discussions \
             WHERE ($1::uuid IS NULL OR repository_id = $1) \
               AND ($2::text IS NULL OR title ILIKE $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(query.repository_id)
        .bind(query.search.as_deref().map(contains_pattern))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to list discussions", e)
        })
    }

    async fn image_names(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT image FROM discussions WHERE image IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to list images", e)
            })
    }
}
