//! Repository store backed by the `repositories` table.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_core::types::PageRequest;
use devhub_entity::repository::{Link, NewRepository, Repository, RepositoryAccess, RepositoryPatch};

use super::{contains_pattern, violates};
use crate::store::{RepositoryQuery, RepositoryStore};

/// Visibility and search predicate shared by `list` and `count`.
const FILTER: &str = "($1::uuid IS NULL OR owner_id = $1) \
     AND ($2 OR access = 'public' OR (access = 'private-group' AND $3::uuid = ANY(custom_access))) \
     AND ($4::text IS NULL OR name ILIKE $4 OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $4))";

/// PostgreSQL repository store.
#[derive(Debug, Clone)]
pub struct PgRepositoryStore {
    pool: PgPool,
}

impl PgRepositoryStore {
    /// Create a new repository store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepositoryStore for PgRepositoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Repository>> {
        sqlx::query_as::<_, Repository>("SELECT * FROM repositories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find repository", e)
            })
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Repository>> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find repository", e)
        })
    }

    async fn find_access(&self, id: Uuid) -> AppResult<Option<RepositoryAccess>> {
        sqlx::query_as::<_, RepositoryAccess>(
            "SELECT owner_id, access, custom_access FROM repositories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                "Failed to load repository access",
                e,
            )
        })
    }

    async fn is_owner(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM repositories WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to check ownership", e)
        })
    }

    async fn create(&self, owner_id: Uuid, data: &NewRepository) -> AppResult<Repository> {
        sqlx::query_as::<_, Repository>(
            "INSERT INTO repositories (id, owner_id, name, description, access) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.access)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "repositories_owner_id_name_key") {
                AppError::conflict(format!("Repository '{}' already exists", data.name))
            } else {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to create repository",
                    e,
                )
            }
        })
    }

    async fn list(
        &self,
        query: &RepositoryQuery,
        page: &PageRequest,
    ) -> AppResult<Vec<Repository>> {
        let sql = format!(
            "SELECT * FROM repositories WHERE {FILTER} \
             ORDER BY updated_at DESC, stars DESC LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Repository>(&sql)
            .bind(query.owner_id)
            .bind(query.unrestricted)
            .bind(query.viewer)
            .bind(query.search.as_deref().map(contains_pattern))
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to list repositories",
                    e,
                )
            })
    }

    async fn count(&self, query: &RepositoryQuery) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM repositories WHERE {FILTER}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(query.owner_id)
            .bind(query.unrestricted)
            .bind(query.viewer)
            .bind(query.search.as_deref().map(contains_pattern))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to count repositories",
                    e,
                )
            })?;
        Ok(total as u64)
    }

    async fn update(&self, id: Uuid, patch: &RepositoryPatch) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE repositories SET \
                description = COALESCE($2, description), \
                content = COALESCE($3, content), \
                access = COALESCE($4, access), \
                custom_access = COALESCE($5, custom_access), \
                tags = COALESCE($6, tags), \
                updated_at = $7 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.description.as_deref())
        .bind(patch.content.as_deref())
        .bind(patch.access)
        .bind(patch.custom_access.as_deref())
        .bind(patch.tags.as_deref())
        .bind(patch.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to update repository", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Repository {id} not found")));
        }
        Ok(())
    }

    async fn add_link(&self, id: Uuid, link: &Link) -> AppResult<()> {
        let result = sqlx::query("UPDATE repositories SET links = links || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![link]))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to add link", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Repository {id} not found")));
        }
        Ok(())
    }

    async fn remove_link(&self, id: Uuid, link_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE repositories SET links = COALESCE( \
                (SELECT jsonb_agg(l) FROM jsonb_array_elements(links) l WHERE l->>'id' <> $2), \
                '[]'::jsonb) \
             WHERE id = $1 \
               AND EXISTS (SELECT 1 FROM jsonb_array_elements(links) l WHERE l->>'id' = $2)",
        )
        .bind(id)
        .bind(link_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to remove link", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE repositories SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to count view", e)
            })?;
        Ok(())
    }

    async fn increment_downloads(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE repositories SET downloads = downloads + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to count download", e)
            })?;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to begin transaction", e)
        })?;

        for sql in [
            "DELETE FROM discussions WHERE repository_id = $1",
            "DELETE FROM likes WHERE repository_id = $1",
            "DELETE FROM system_files WHERE repository_id = $1",
        ] {
            sqlx::query(sql)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::ServiceUnavailable,
                        "Failed to delete repository contents",
                        e,
                    )
                })?;
        }

        let result = sqlx::query("DELETE FROM repositories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Failed to delete repository",
                    e,
                )
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Repository {id} not found")));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to commit deletion", e)
        })
    }
}
