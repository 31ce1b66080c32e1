//! Document store traits.
//!
//! Services depend on these traits only. Operations documented as atomic
//! must either apply completely or not at all: the PostgreSQL store runs them
//! in one transaction, the memory store under one lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use devhub_core::result::AppResult;
use devhub_core::types::PageRequest;
use devhub_entity::discussion::Discussion;
use devhub_entity::like::Like;
use devhub_entity::repository::{Link, NewRepository, Repository, RepositoryAccess, RepositoryPatch};
use devhub_entity::system_file::{NewSystemFile, SystemFile};
use devhub_entity::user::{NewUser, NewUserToken, TokenPurpose, User, UserToken};

/// Filter for repository listings.
#[derive(Debug, Clone, Default)]
pub struct RepositoryQuery {
    /// Restrict to one owner.
    pub owner_id: Option<Uuid>,
    /// Caller whose allow-list membership widens the result.
    pub viewer: Option<Uuid>,
    /// Skip the visibility filter (an owner listing their own repositories).
    pub unrestricted: bool,
    /// Case-insensitive substring on the name or any tag.
    pub search: Option<String>,
}

impl RepositoryQuery {
    /// Whether `repository` passes this filter.
    pub fn matches(&self, repository: &Repository) -> bool {
        if self.owner_id.is_some_and(|owner| owner != repository.owner_id) {
            return false;
        }
        if !self.unrestricted && !listing_visible(repository, self.viewer) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => {
                let term = term.to_lowercase();
                repository.name.to_lowercase().contains(&term)
                    || repository
                        .tags
                        .iter()
                        .any(|t| t.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

/// Listing visibility: public, or group tier with the viewer allow-listed.
///
/// The owner's own non-public repositories are not part of the shared
/// listing; they show up under the owner's profile instead.
pub fn listing_visible(repository: &Repository, viewer: Option<Uuid>) -> bool {
    use devhub_entity::repository::Access;
    match repository.access {
        Access::Public => true,
        Access::Private => false,
        Access::PrivateGroup => viewer.is_some_and(|v| repository.custom_access.contains(&v)),
    }
}

/// Filter for discussion listings.
#[derive(Debug, Clone, Default)]
pub struct DiscussionQuery {
    /// Restrict to one repository.
    pub repository_id: Option<Uuid>,
    /// Case-insensitive substring on the title.
    pub search: Option<String>,
}

impl DiscussionQuery {
    /// Whether `discussion` passes this filter.
    pub fn matches(&self, discussion: &Discussion) -> bool {
        if self
            .repository_id
            .is_some_and(|r| discussion.repository_id != Some(r))
        {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => discussion
                .title
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        }
    }
}

/// Repository documents.
#[async_trait]
pub trait RepositoryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a repository by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Repository>>;

    /// Find a repository by owner and name.
    async fn find_by_owner_and_name(&self, owner_id: Uuid, name: &str)
    -> AppResult<Option<Repository>>;

    /// Load only the fields the access resolver needs.
    async fn find_access(&self, id: Uuid) -> AppResult<Option<RepositoryAccess>>;

    /// Whether `user_id` owns repository `id`.
    async fn is_owner(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Insert a repository. A duplicate `(owner, name)` is a `Conflict`.
    async fn create(&self, owner_id: Uuid, data: &NewRepository) -> AppResult<Repository>;

    /// List one page, sorted by `updated_at` desc then `stars` desc.
    async fn list(&self, query: &RepositoryQuery, page: &PageRequest) -> AppResult<Vec<Repository>>;

    /// Count everything matching `query`.
    async fn count(&self, query: &RepositoryQuery) -> AppResult<u64>;

    /// Apply a patch. Fails with `NotFound` when the repository is absent.
    async fn update(&self, id: Uuid, patch: &RepositoryPatch) -> AppResult<()>;

    /// Append a link.
    async fn add_link(&self, id: Uuid, link: &Link) -> AppResult<()>;

    /// Remove a link by id. Returns whether anything was removed.
    async fn remove_link(&self, id: Uuid, link_id: Uuid) -> AppResult<bool>;

    /// Add one to the view counter.
    async fn increment_views(&self, id: Uuid) -> AppResult<()>;

    /// Add one to the download counter.
    async fn increment_downloads(&self, id: Uuid) -> AppResult<()>;

    /// Atomically delete the repository with its nodes, likes and attached discussions.
    async fn delete_cascade(&self, id: Uuid) -> AppResult<()>;
}

/// Tree node documents.
#[async_trait]
pub trait NodeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a node by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SystemFile>>;

    /// Load every node in `ids` that exists, in no particular order.
    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<SystemFile>>;

    /// Atomically insert a node and link it into its parent directory, or
    /// into the repository's top-level set when it has no parent.
    async fn create_linked(&self, data: &NewSystemFile) -> AppResult<SystemFile>;

    /// Atomically delete `node_id` with every node below it and remove it
    /// from its former parent (`parent_id`, or the repository's top-level
    /// set). The subtree is resolved inside the same atomic step, so a node
    /// linked under it concurrently is deleted too. Returns how many nodes
    /// were removed.
    async fn delete_subtree(
        &self,
        repository_id: Uuid,
        node_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<u64>;

    /// Every blob name referenced by a file node.
    async fn blob_names(&self) -> AppResult<Vec<String>>;
}

/// User documents.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by e-mail.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. Duplicate e-mail or username is a `Conflict`.
    async fn create(&self, data: &NewUser) -> AppResult<User>;

    /// Mark the account as confirmed.
    async fn activate(&self, id: Uuid) -> AppResult<()>;
}

/// Like documents.
#[async_trait]
pub trait LikeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user's like on a repository.
    async fn find(&self, user_id: Uuid, repository_id: Uuid) -> AppResult<Option<Like>>;

    /// Atomically record the vote and adjust the star counter.
    ///
    /// Returns the new star count. Fails with `NotFound` when the
    /// repository is absent.
    async fn toggle(&self, user_id: Uuid, repository_id: Uuid, plus: bool) -> AppResult<i64>;
}

/// Discussion documents.
#[async_trait]
pub trait DiscussionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a discussion.
    async fn insert(&self, discussion: &Discussion) -> AppResult<()>;

    /// Find a discussion by its public code.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Discussion>>;

    /// List one page, newest first.
    async fn list(&self, query: &DiscussionQuery, page: &PageRequest) -> AppResult<Vec<Discussion>>;

    /// Every blob name referenced as a discussion image.
    async fn image_names(&self) -> AppResult<Vec<String>>;
}

/// One-time user tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a token.
    async fn create(&self, data: &NewUserToken) -> AppResult<UserToken>;

    /// Find a token that has not expired at `now`.
    async fn find_valid(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserToken>>;

    /// Every token of one purpose issued to `user_id`, expired ones included.
    async fn find_by_user(&self, user_id: Uuid, purpose: TokenPurpose) -> AppResult<Vec<UserToken>>;

    /// Delete a token.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Delete every token that expired before `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
