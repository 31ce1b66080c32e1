//! Discussion posts, optionally attached to a repository.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use devhub_auth::token::public_code;
use devhub_core::concurrency::with_deadline;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_core::traits::StorageProvider;
use devhub_core::types::{PageRequest, PageResponse};
use devhub_database::store::{DiscussionQuery, DiscussionStore};
use devhub_entity::discussion::{Discussion, NewDiscussion};
use devhub_entity::validation::ValidateExt;
use devhub_storage::{blob_name, mime_from_path};

use crate::access::AccessResolver;
use crate::context::RequestContext;
use crate::tree::UploadedFile;

/// Handles of a freshly published discussion.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedDiscussion {
    /// Discussion id.
    pub id: Uuid,
    /// Public code used in URLs.
    pub code: String,
}

/// Publishes, loads and lists discussions.
#[derive(Debug, Clone)]
pub struct DiscussionService {
    /// Discussion store.
    discussions: Arc<dyn DiscussionStore>,
    /// Object store for attached images.
    storage: Arc<dyn StorageProvider>,
    /// Visibility checks for attached repositories.
    access: AccessResolver,
    /// Discussions per page.
    page_size: u64,
    /// Deadline for one blob write.
    operation_timeout: Duration,
}

impl DiscussionService {
    /// Creates a new discussion service.
    pub fn new(
        discussions: Arc<dyn DiscussionStore>,
        storage: Arc<dyn StorageProvider>,
        access: AccessResolver,
        page_size: u64,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            discussions,
            storage,
            access,
            page_size,
            operation_timeout,
        }
    }

    /// Publishes a discussion. Attaching it to a repository requires owning that repository.
    pub async fn publish(
        &self,
        ctx: &RequestContext,
        data: NewDiscussion,
        image: Option<UploadedFile>,
    ) -> AppResult<PublishedDiscussion> {
        data.validate_input()?;
        if let Some(repository_id) = data.repository_id {
            self.access.require_owner(repository_id, ctx.user_id).await?;
        }

        let image = match image {
            Some(file) => {
                if !mime_from_path(&file.file_name).starts_with("image/") {
                    return Err(AppError::bad_request("The attached file must be an image"));
                }
                let name = blob_name(&file.file_name);
                with_deadline(
                    self.operation_timeout,
                    "Image upload",
                    self.storage.write(&name, file.data),
                )
                .await?;
                Some(name)
            }
            None => None,
        };

        let now = Utc::now();
        let discussion = Discussion {
            id: Uuid::new_v4(),
            code: public_code(),
            title: data.title,
            text: data.text,
            snippet: data.snippet.filter(|s| !s.trim().is_empty()),
            tags: data.tags,
            owner_id: ctx.user_id,
            repository_id: data.repository_id,
            image,
            created_at: now,
            updated_at: now,
        };
        self.discussions.insert(&discussion).await?;

        info!(
            user_id = %ctx.user_id,
            discussion_id = %discussion.id,
            repository_id = ?discussion.repository_id,
            "Discussion published"
        );

        Ok(PublishedDiscussion {
            id: discussion.id,
            code: discussion.code,
        })
    }

    /// Loads a discussion by code, checking the attached repository is visible.
    pub async fn get(&self, code: &str, ctx: Option<&RequestContext>) -> AppResult<Discussion> {
        let discussion = self
            .discussions
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Discussion not found"))?;

        if let Some(repository_id) = discussion.repository_id {
            if !self
                .access
                .has_access(repository_id, RequestContext::principal(ctx))
                .await?
            {
                return Err(AppError::unauthorized(
                    "You do not have access to this discussion",
                ));
            }
        }

        Ok(discussion)
    }

    /// One page of discussions, newest first, hiding those on invisible repositories.
    pub async fn list(
        &self,
        ctx: Option<&RequestContext>,
        repository_id: Option<Uuid>,
        search: Option<String>,
        page: u64,
    ) -> AppResult<PageResponse<Discussion>> {
        let query = DiscussionQuery {
            repository_id,
            search: search.filter(|s| !s.trim().is_empty()),
        };
        let request = PageRequest::new(page, self.page_size);

        let items = self.discussions.list(&query, &request).await?;
        let visible = self
            .access
            .filter_accessible(items, RequestContext::principal(ctx), |d| d.repository_id)
            .await?;

        Ok(PageResponse::new(visible, &request, None))
    }
}
