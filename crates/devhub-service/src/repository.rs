//! Repository use cases: lookup, listing, updates, likes, links, downloads.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use devhub_cache::CacheManager;
use devhub_cache::keys;
use devhub_core::concurrency::parallel_map;
use devhub_core::config::RepositoryConfig;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_core::traits::CacheProvider;
use devhub_core::types::{PageRequest, PageResponse};
use devhub_database::store::{LikeStore, RepositoryQuery, RepositoryStore, UserStore};
use devhub_entity::repository::{
    Link, NewLink, NewRepository, Repository, RepositoryPatch, RepositoryUpdate,
};
use devhub_entity::system_file::SystemFile;
use devhub_entity::user::{User, UserSummary};
use devhub_entity::validation::ValidateExt;

use crate::access::AccessResolver;
use crate::archive::{Archive, ArchiveBuilder};
use crate::context::RequestContext;
use crate::tree::{NodeForm, TreeEngine, UploadedFile};

/// A repository as shown on its page.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryDetail {
    /// The repository document.
    #[serde(flatten)]
    pub repository: Repository,
    /// Public summary of the owner.
    pub owner: UserSummary,
    /// Top-level nodes, directories first.
    pub elements: Vec<SystemFile>,
    /// The caller's vote, if any.
    pub like: Option<bool>,
}

/// Orchestrates repository operations over the stores, tree and cache.
#[derive(Debug, Clone)]
pub struct RepositoryService {
    /// Repository store.
    repositories: Arc<dyn RepositoryStore>,
    /// User store.
    users: Arc<dyn UserStore>,
    /// Like store.
    likes: Arc<dyn LikeStore>,
    /// Visibility and ownership checks.
    access: AccessResolver,
    /// File tree.
    tree: TreeEngine,
    /// Zip builder.
    archive: ArchiveBuilder,
    /// Cache for the view throttle.
    cache: Arc<CacheManager>,
    /// Paging and throttle settings.
    config: RepositoryConfig,
}

impl RepositoryService {
    /// Creates a new repository service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repositories: Arc<dyn RepositoryStore>,
        users: Arc<dyn UserStore>,
        likes: Arc<dyn LikeStore>,
        access: AccessResolver,
        tree: TreeEngine,
        archive: ArchiveBuilder,
        cache: Arc<CacheManager>,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            repositories,
            users,
            likes,
            access,
            tree,
            archive,
            cache,
            config,
        }
    }

    async fn find_user(&self, username: &str) -> AppResult<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }

    async fn find_repository(&self, repository_id: Uuid) -> AppResult<Repository> {
        self.repositories
            .find_by_id(repository_id)
            .await?
            .ok_or_else(|| AppError::not_found("Repository not found"))
    }

    /// Resolves `username/name` and checks the caller may see it.
    async fn resolve_visible(
        &self,
        username: &str,
        name: &str,
        principal: Option<Uuid>,
    ) -> AppResult<(User, Repository)> {
        let owner = self.find_user(username).await?;
        let repository = self
            .repositories
            .find_by_owner_and_name(owner.id, name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Repository '{username}/{name}' not found")))?;

        if !repository.access_info().admits(principal) {
            return Err(AppError::unauthorized(
                "You do not have access to this repository",
            ));
        }

        Ok((owner, repository))
    }

    /// Loads a repository page and records a throttled view.
    pub async fn get_repository(
        &self,
        username: &str,
        name: &str,
        ctx: Option<&RequestContext>,
    ) -> AppResult<RepositoryDetail> {
        let principal = RequestContext::principal(ctx);
        let (owner, repository) = self.resolve_visible(username, name, principal).await?;

        let elements = self.tree.listing(&repository.system_files).await?;
        let like = match principal {
            Some(user_id) => self
                .likes
                .find(user_id, repository.id)
                .await?
                .map(|l| l.plus),
            None => None,
        };

        let service = self.clone();
        let repository_id = repository.id;
        tokio::spawn(async move {
            service.record_view(repository_id, principal).await;
        });

        Ok(RepositoryDetail {
            repository,
            owner: owner.summary(),
            elements,
            like,
        })
    }

    /// Counts a view unless this principal was already counted in the current window.
    ///
    /// Best effort: failures are logged and dropped.
    pub async fn record_view(&self, repository_id: Uuid, principal: Option<Uuid>) {
        let key = keys::repository_view(repository_id, principal);
        let window = Duration::from_secs(self.config.view_window_hours * 3600);

        match self.cache.set_nx(&key, "1", window).await {
            Ok(true) => {
                if let Err(e) = self.repositories.increment_views(repository_id).await {
                    warn!(repository_id = %repository_id, error = %e, "Failed to count view");
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(repository_id = %repository_id, error = %e, "View throttle unavailable");
            }
        }
    }

    /// Immediate children of a folder in a visible repository.
    pub async fn get_folder(
        &self,
        username: &str,
        name: &str,
        folder_id: Uuid,
        ctx: Option<&RequestContext>,
    ) -> AppResult<Vec<SystemFile>> {
        let (_, repository) = self
            .resolve_visible(username, name, RequestContext::principal(ctx))
            .await?;
        self.tree.folder_children(repository.id, folder_id).await
    }

    /// The shared listing: public repositories plus group repositories the caller is on.
    pub async fn get_repositories(
        &self,
        ctx: Option<&RequestContext>,
        search: Option<String>,
        page: u64,
        want_total: bool,
    ) -> AppResult<PageResponse<Repository>> {
        let query = RepositoryQuery {
            viewer: RequestContext::principal(ctx),
            search: search.filter(|s| !s.trim().is_empty()),
            ..RepositoryQuery::default()
        };
        let request = PageRequest::new(page, self.config.page_size);

        let items = self.repositories.list(&query, &request).await?;
        let total = if want_total {
            Some(self.repositories.count(&query).await?)
        } else {
            None
        };

        Ok(PageResponse::new(items, &request, total))
    }

    /// Repositories of one user. The owner sees all of them.
    pub async fn get_user_repositories(
        &self,
        username: &str,
        ctx: Option<&RequestContext>,
        page: u64,
    ) -> AppResult<PageResponse<Repository>> {
        let owner = self.find_user(username).await?;
        let principal = RequestContext::principal(ctx);
        let query = RepositoryQuery {
            owner_id: Some(owner.id),
            viewer: principal,
            unrestricted: principal == Some(owner.id),
            search: None,
        };
        let request = PageRequest::new(page, self.config.page_size);

        let items = self.repositories.list(&query, &request).await?;
        Ok(PageResponse::new(items, &request, None))
    }

    /// Creates a repository owned by the caller.
    pub async fn upload_repository(
        &self,
        ctx: &RequestContext,
        data: NewRepository,
    ) -> AppResult<Repository> {
        data.validate_input()?;
        let repository = self.repositories.create(ctx.user_id, &data).await?;

        info!(
            user_id = %ctx.user_id,
            repository_id = %repository.id,
            name = %repository.name,
            "Repository created"
        );

        Ok(repository)
    }

    /// Applies an owner's changes.
    ///
    /// Allow-list usernames are resolved before anything is written; one
    /// unknown name rejects the whole update.
    pub async fn update_repository(
        &self,
        repository_id: Uuid,
        ctx: &RequestContext,
        update: RepositoryUpdate,
    ) -> AppResult<()> {
        update.validate_input()?;
        self.access.require_owner(repository_id, ctx.user_id).await?;

        let current = self.access.get_repo_access(repository_id).await?;
        let tier = update.access.unwrap_or(current.access);

        let custom_access = if !tier.uses_allow_list() {
            Some(Vec::new())
        } else if let Some(usernames) = update.custom_access {
            Some(self.resolve_usernames(usernames).await?)
        } else {
            None
        };

        let patch = RepositoryPatch {
            description: update.description.filter(|d| !d.trim().is_empty()),
            content: update.content.filter(|c| !c.trim().is_empty()),
            access: update.access,
            custom_access,
            tags: update.tags,
            updated_at: Utc::now(),
        };
        self.repositories.update(repository_id, &patch).await?;

        info!(
            user_id = %ctx.user_id,
            repository_id = %repository_id,
            access = %tier,
            "Repository updated"
        );

        Ok(())
    }

    /// Resolves usernames to ids, deduplicated, in input order.
    async fn resolve_usernames(&self, usernames: Vec<String>) -> AppResult<Vec<Uuid>> {
        let users = Arc::clone(&self.users);
        let ids = parallel_map(usernames, self.config.resolve_concurrency, move |username| {
            let users = Arc::clone(&users);
            async move {
                users
                    .find_by_username(&username)
                    .await?
                    .map(|u| u.id)
                    .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
            }
        })
        .await?;

        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Ok(unique)
    }

    /// Deletes a repository with its tree, likes and attached discussions.
    pub async fn delete_repository(&self, repository_id: Uuid, ctx: &RequestContext) -> AppResult<()> {
        self.access.require_owner(repository_id, ctx.user_id).await?;
        self.repositories.delete_cascade(repository_id).await?;

        info!(user_id = %ctx.user_id, repository_id = %repository_id, "Repository deleted");
        Ok(())
    }

    /// Records the caller's vote and returns the new star count.
    pub async fn toggle_like(
        &self,
        repository_id: Uuid,
        ctx: &RequestContext,
        plus: bool,
    ) -> AppResult<i64> {
        if !self.access.has_access(repository_id, Some(ctx.user_id)).await? {
            return Err(AppError::unauthorized(
                "You do not have access to this repository",
            ));
        }
        let stars = self.likes.toggle(ctx.user_id, repository_id, plus).await?;

        info!(
            user_id = %ctx.user_id,
            repository_id = %repository_id,
            plus,
            stars,
            "Like recorded"
        );

        Ok(stars)
    }

    /// Attaches a link to a repository.
    pub async fn add_link(
        &self,
        repository_id: Uuid,
        ctx: &RequestContext,
        data: NewLink,
    ) -> AppResult<Link> {
        self.access.require_owner(repository_id, ctx.user_id).await?;
        data.validate_input()?;

        let link = data.into_link();
        self.repositories.add_link(repository_id, &link).await?;

        info!(repository_id = %repository_id, link_id = %link.id, "Link added");
        Ok(link)
    }

    /// Removes a link from a repository.
    pub async fn delete_link(
        &self,
        repository_id: Uuid,
        link_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<()> {
        self.access.require_owner(repository_id, ctx.user_id).await?;

        if !self.repositories.remove_link(repository_id, link_id).await? {
            return Err(AppError::not_found("Link not found"));
        }

        info!(repository_id = %repository_id, link_id = %link_id, "Link removed");
        Ok(())
    }

    /// Adds a file or directory to a repository the caller owns.
    pub async fn create_element(
        &self,
        repository_id: Uuid,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
        form: NodeForm,
        file: Option<UploadedFile>,
    ) -> AppResult<SystemFile> {
        self.access.require_owner(repository_id, ctx.user_id).await?;
        self.tree
            .create_node(repository_id, parent_id, form, file)
            .await
    }

    /// Removes an element and its subtree from a repository the caller owns.
    pub async fn delete_element(
        &self,
        repository_id: Uuid,
        node_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<()> {
        self.tree
            .delete_element(repository_id, node_id, ctx.user_id)
            .await
    }

    /// Archives a whole repository, or one element of it when `child` is set.
    ///
    /// Only full downloads count towards `downloads`.
    pub async fn download_repository(
        &self,
        repository_id: Uuid,
        ctx: Option<&RequestContext>,
        child: Option<Uuid>,
    ) -> AppResult<Archive> {
        if !self
            .access
            .has_access(repository_id, RequestContext::principal(ctx))
            .await?
        {
            return Err(AppError::unauthorized(
                "You do not have access to this repository",
            ));
        }

        match child {
            Some(child_id) => {
                let node = self.tree.get_node(child_id).await?;
                if !self.tree.is_in_repository(&node, repository_id).await? {
                    return Err(AppError::unauthorized(
                        "Element does not belong to this repository",
                    ));
                }
                let name = node
                    .name
                    .rsplit_once('.')
                    .map(|(stem, _)| stem.to_string())
                    .filter(|stem| !stem.is_empty())
                    .unwrap_or_else(|| node.name.clone());
                self.archive.stream(name, &[node.id]).await
            }
            None => {
                let repository = self.find_repository(repository_id).await?;
                self.repositories.increment_downloads(repository_id).await?;
                self.archive
                    .stream(repository.name, &repository.system_files)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use devhub_core::error::ErrorKind;
    use devhub_entity::repository::{Access, LinkKind};
    use futures::StreamExt;

    use crate::testing::Fixture;

    async fn stars(fx: &Fixture, id: Uuid) -> i64 {
        fx.stores.repositories.find_by_id(id).await.unwrap().unwrap().stars
    }

    #[tokio::test]
    async fn test_toggle_like_is_idempotent_and_flips_by_two() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let fan = fx.ctx("fan").await;
        let repo = fx.repository(owner, "liked", Access::Public).await;

        assert_eq!(fx.repositories.toggle_like(repo, &fan, true).await.unwrap(), 1);
        assert_eq!(fx.repositories.toggle_like(repo, &fan, true).await.unwrap(), 1);
        assert_eq!(fx.repositories.toggle_like(repo, &fan, false).await.unwrap(), -1);
        assert_eq!(stars(&fx, repo).await, -1);

        let err = fx
            .repositories
            .toggle_like(Uuid::new_v4(), &fan, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_listing_never_leaks_hidden_repositories() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let member = fx.ctx("member").await;
        let outsider = fx.ctx("outsider").await;
        let owner_ctx = fx.ctx_for(owner, "owner");

        fx.repository(owner, "open", Access::Public).await;
        fx.repository(owner, "closed", Access::Private).await;
        let group = fx.repository(owner, "club", Access::PrivateGroup).await;
        fx.repository(owner, "other_club", Access::PrivateGroup).await;

        fx.repositories
            .update_repository(
                group,
                &owner_ctx,
                RepositoryUpdate {
                    custom_access: Some(vec!["member".into()]),
                    ..RepositoryUpdate::default()
                },
            )
            .await
            .unwrap();

        let names = |page: PageResponse<Repository>| {
            let mut names: Vec<String> = page.items.into_iter().map(|r| r.name).collect();
            names.sort();
            names
        };

        let seen = fx
            .repositories
            .get_repositories(Some(&member), None, 1, true)
            .await
            .unwrap();
        assert_eq!(seen.total, Some(2));
        assert_eq!(names(seen), vec!["club", "open"]);

        let seen = fx
            .repositories
            .get_repositories(Some(&outsider), None, 1, false)
            .await
            .unwrap();
        assert_eq!(seen.total, None);
        assert_eq!(names(seen), vec!["open"]);

        let seen = fx.repositories.get_repositories(None, None, 1, false).await.unwrap();
        assert_eq!(names(seen), vec!["open"]);

        let own = fx
            .repositories
            .get_user_repositories("owner", Some(&owner_ctx), 1)
            .await
            .unwrap();
        assert_eq!(names(own), vec!["closed", "club", "open", "other_club"]);

        let theirs = fx
            .repositories
            .get_user_repositories("owner", Some(&member), 1)
            .await
            .unwrap();
        assert_eq!(names(theirs), vec!["club", "open"]);
    }

    #[tokio::test]
    async fn test_listing_search_matches_name_and_tags() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        fx.repository(owner, "rust_parser", Access::Public).await;
        let tagged = fx.repository(owner, "misc", Access::Public).await;
        fx.repository(owner, "other", Access::Public).await;
        fx.repositories
            .update_repository(
                tagged,
                &owner_ctx,
                RepositoryUpdate {
                    tags: Some(vec!["Rust".into()]),
                    ..RepositoryUpdate::default()
                },
            )
            .await
            .unwrap();

        let page = fx
            .repositories
            .get_repositories(None, Some("RUST".into()), 1, true)
            .await
            .unwrap();
        assert_eq!(page.total, Some(2));
    }

    #[tokio::test]
    async fn test_failed_username_resolution_rejects_update() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        fx.user("alice").await;
        let repo = fx.repository(owner, "club", Access::Public).await;

        let err = fx
            .repositories
            .update_repository(
                repo,
                &owner_ctx,
                RepositoryUpdate {
                    description: Some("changed".into()),
                    access: Some(Access::PrivateGroup),
                    custom_access: Some(vec!["alice".into(), "ghost".into()]),
                    ..RepositoryUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert_eq!(stored.access, Access::Public);
        assert!(stored.custom_access.is_empty());
        assert_eq!(stored.description, "");
    }

    #[tokio::test]
    async fn test_leaving_group_tier_clears_allow_list() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        fx.user("alice").await;
        let repo = fx.repository(owner, "club", Access::PrivateGroup).await;

        fx.repositories
            .update_repository(
                repo,
                &owner_ctx,
                RepositoryUpdate {
                    custom_access: Some(vec!["alice".into(), "alice".into()]),
                    ..RepositoryUpdate::default()
                },
            )
            .await
            .unwrap();
        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert_eq!(stored.custom_access.len(), 1);

        fx.repositories
            .update_repository(
                repo,
                &owner_ctx,
                RepositoryUpdate {
                    access: Some(Access::Private),
                    description: Some("  ".into()),
                    ..RepositoryUpdate::default()
                },
            )
            .await
            .unwrap();
        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert_eq!(stored.access, Access::Private);
        assert!(stored.custom_access.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let other = fx.ctx("other").await;
        let repo = fx.repository(owner, "mine", Access::Public).await;

        let err = fx
            .repositories
            .update_repository(repo, &other, RepositoryUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_elements_are_owner_only() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        let other = fx.ctx("other").await;
        let repo = fx.repository(owner, "tree", Access::Public).await;
        let folder = NodeForm {
            name: "docs".into(),
            is_directory: true,
        };

        let err = fx
            .repositories
            .create_element(repo, &other, None, folder.clone(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let node = fx
            .repositories
            .create_element(repo, &owner_ctx, None, folder, None)
            .await
            .unwrap();
        let err = fx
            .repositories
            .delete_element(repo, node.id, &other)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        fx.repositories
            .delete_element(repo, node.id, &owner_ctx)
            .await
            .unwrap();
        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert!(stored.system_files.is_empty());
    }

    #[tokio::test]
    async fn test_view_throttle_counts_once_per_window() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let viewer = fx.user("viewer").await;
        let repo = fx.repository(owner, "popular", Access::Public).await;

        fx.repositories.record_view(repo, Some(viewer)).await;
        fx.repositories.record_view(repo, Some(viewer)).await;
        fx.repositories.record_view(repo, None).await;
        fx.repositories.record_view(repo, None).await;

        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert_eq!(stored.views, 2);
    }

    #[tokio::test]
    async fn test_get_repository_checks_access() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        fx.repository(owner, "hidden", Access::Private).await;

        let err = fx
            .repositories
            .get_repository("owner", "hidden", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let detail = fx
            .repositories
            .get_repository("owner", "hidden", Some(&owner_ctx))
            .await
            .unwrap();
        assert_eq!(detail.owner.username, "owner");
        assert_eq!(detail.like, None);

        let err = fx
            .repositories
            .get_repository("owner", "missing", Some(&owner_ctx))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let fx = Fixture::new().await;
        let owner = fx.ctx("owner").await;
        let data = NewRepository {
            name: "twice".into(),
            description: String::new(),
            access: Access::Public,
        };
        fx.repositories.upload_repository(&owner, data.clone()).await.unwrap();
        let err = fx
            .repositories
            .upload_repository(&owner, data)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_links() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        let repo = fx.repository(owner, "linked", Access::Public).await;

        let bad = NewLink {
            kind: LinkKind::Github,
            title: "Source".into(),
            url: "ftp://example.com".into(),
        };
        let err = fx.repositories.add_link(repo, &owner_ctx, bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);

        let link = fx
            .repositories
            .add_link(
                repo,
                &owner_ctx,
                NewLink {
                    kind: LinkKind::Github,
                    title: "Source".into(),
                    url: "https://github.com/example/linked".into(),
                },
            )
            .await
            .unwrap();

        fx.repositories.delete_link(repo, link.id, &owner_ctx).await.unwrap();
        let err = fx
            .repositories
            .delete_link(repo, link.id, &owner_ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_download_counts_full_archives_only() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "shipped", Access::Public).await;
        let node = fx
            .tree
            .create_node(
                repo,
                None,
                NodeForm::default(),
                Some(UploadedFile {
                    file_name: "notes.txt".into(),
                    data: Bytes::from_static(b"hello"),
                }),
            )
            .await
            .unwrap();

        let archive = fx
            .repositories
            .download_repository(repo, None, Some(node.id))
            .await
            .unwrap();
        assert_eq!(archive.name, "notes");

        let mut archive = fx
            .repositories
            .download_repository(repo, None, None)
            .await
            .unwrap();
        assert_eq!(archive.name, "shipped");
        let mut size = 0;
        while let Some(chunk) = archive.stream.next().await {
            size += chunk.unwrap().len();
        }
        assert!(size > 0);

        let stored = fx.stores.repositories.find_by_id(repo).await.unwrap().unwrap();
        assert_eq!(stored.downloads, 1);
    }

    #[tokio::test]
    async fn test_download_rejects_foreign_child() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "a", Access::Public).await;
        let other = fx.repository(owner, "b", Access::Public).await;
        let node = fx
            .tree
            .create_node(
                other,
                None,
                NodeForm {
                    name: "d".into(),
                    is_directory: true,
                },
                None,
            )
            .await
            .unwrap();

        let err = fx
            .repositories
            .download_repository(repo, None, Some(node.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_delete_repository_cascades() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let owner_ctx = fx.ctx_for(owner, "owner");
        let repo = fx.repository(owner, "temp", Access::Public).await;
        let node = fx
            .tree
            .create_node(
                repo,
                None,
                NodeForm {
                    name: "d".into(),
                    is_directory: true,
                },
                None,
            )
            .await
            .unwrap();

        fx.repositories.delete_repository(repo, &owner_ctx).await.unwrap();

        assert!(fx.stores.repositories.find_by_id(repo).await.unwrap().is_none());
        let err = fx.tree.get_node(node.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
