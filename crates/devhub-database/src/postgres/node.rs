//! Node store backed by the `system_files` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_entity::system_file::{NewSystemFile, SystemFile};

use crate::store::NodeStore;

/// PostgreSQL node store.
#[derive(Debug, Clone)]
pub struct PgNodeStore {
    pool: PgPool,
}

impl PgNodeStore {
    /// Create a new node store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NodeStore for PgNodeStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SystemFile>> {
        sqlx::query_as::<_, SystemFile>("SELECT * FROM system_files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to find node", e)
            })
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<SystemFile>> {
        sqlx::query_as::<_, SystemFile>("SELECT * FROM system_files WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to load nodes", e)
            })
    }

    async fn create_linked(&self, data: &NewSystemFile) -> AppResult<SystemFile> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to begin transaction", e)
        })?;

        // Lock the container the node is linked into.
        match data.parent_id {
            Some(parent_id) => {
                let is_directory: Option<bool> = sqlx::query_scalar(
                    "SELECT is_directory FROM system_files WHERE id = $1 FOR UPDATE",
                )
                .bind(parent_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to lock folder", e)
                })?;
                match is_directory {
                    None => {
                        return Err(AppError::not_found(format!("Folder {parent_id} not found")));
                    }
                    Some(false) => {
                        return Err(AppError::bad_request(format!(
                            "Node {parent_id} is not a directory"
                        )));
                    }
                    Some(true) => {}
                }
            }
            None => {
                let exists: Option<Uuid> =
                    sqlx::query_scalar("SELECT id FROM repositories WHERE id = $1 FOR UPDATE")
                        .bind(data.repository_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| {
                            AppError::with_source(
                                ErrorKind::ServiceUnavailable,
                                "Failed to lock repository",
                                e,
                            )
                        })?;
                if exists.is_none() {
                    return Err(AppError::not_found(format!(
                        "Repository {} not found",
                        data.repository_id
                    )));
                }
            }
        }

        let node = sqlx::query_as::<_, SystemFile>(
            "INSERT INTO system_files (id, repository_id, parent_id, name, is_directory, mime_type, blob_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.repository_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(data.is_directory)
        .bind(data.mime_type.as_deref())
        .bind(data.blob_name.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to create node", e))?;

        let link = match data.parent_id {
            Some(parent_id) => sqlx::query(
                "UPDATE system_files SET children = array_append(children, $2) \
                 WHERE id = $1 AND NOT ($2 = ANY(children))",
            )
            .bind(parent_id),
            None => sqlx::query(
                "UPDATE repositories SET system_files = array_append(system_files, $2) \
                 WHERE id = $1 AND NOT ($2 = ANY(system_files))",
            )
            .bind(data.repository_id),
        };
        link.bind(node.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to link node", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to commit node", e)
        })?;
        Ok(node)
    }

    async fn delete_subtree(
        &self,
        repository_id: Uuid,
        node_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to begin transaction", e)
        })?;

        // Lock the subtree so a concurrent insert under it waits for us and
        // then finds its parent gone. Rows committed before the lock are
        // removed by the `parent_id` cascade.
        let locked: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM system_files
            WHERE id IN (
                WITH RECURSIVE subtree AS (
                    SELECT id FROM system_files WHERE id = $1
                    UNION
                    SELECT s.id FROM system_files s JOIN subtree t ON s.parent_id = t.id
                )
                SELECT id FROM subtree
            )
            FOR UPDATE
            "#,
        )
        .bind(node_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to lock subtree", e))?;

        if locked.is_empty() {
            return Err(AppError::not_found(format!("Element {node_id} not found")));
        }

        let unlink = match parent_id {
            Some(parent_id) => sqlx::query(
                "UPDATE system_files SET children = array_remove(children, $2) WHERE id = $1",
            )
            .bind(parent_id),
            None => sqlx::query(
                "UPDATE repositories SET system_files = array_remove(system_files, $2) WHERE id = $1",
            )
            .bind(repository_id),
        };
        unlink
            .bind(node_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to unlink node", e))?;

        sqlx::query("DELETE FROM system_files WHERE id = $1")
            .bind(node_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to delete nodes", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to commit deletion", e)
        })?;

        Ok(locked.len() as u64)
    }

    async fn blob_names(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT blob_name FROM system_files WHERE blob_name IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to list blob names", e)
        })
    }
}
