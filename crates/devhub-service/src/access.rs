//! Access control resolver for the three repository visibility tiers.
//!
//! Every visibility or ownership decision in the services goes through
//! [`AccessResolver`]:
//!
//! - `public`: everyone, anonymous callers included
//! - `private`: the owner only
//! - `private-group`: the owner and the users on the allow-list

use std::sync::Arc;

use uuid::Uuid;

use devhub_core::concurrency::parallel_map;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_database::store::RepositoryStore;
use devhub_entity::repository::RepositoryAccess;

/// Resolves repository visibility and ownership.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    /// Repository store.
    repositories: Arc<dyn RepositoryStore>,
    /// Concurrent checks when filtering a batch.
    batch_concurrency: usize,
}

impl AccessResolver {
    /// Creates a new resolver.
    pub fn new(repositories: Arc<dyn RepositoryStore>, batch_concurrency: usize) -> Self {
        Self {
            repositories,
            batch_concurrency,
        }
    }

    /// Loads the owner, tier and allow-list of a repository.
    pub async fn get_repo_access(&self, repository_id: Uuid) -> AppResult<RepositoryAccess> {
        self.repositories
            .find_access(repository_id)
            .await?
            .ok_or_else(|| AppError::not_found("Repository not found"))
    }

    /// Whether `principal` may see repository `repository_id`.
    pub async fn has_access(
        &self,
        repository_id: Uuid,
        principal: Option<Uuid>,
    ) -> AppResult<bool> {
        let access = self.get_repo_access(repository_id).await?;
        Ok(access.admits(principal))
    }

    /// Keeps the items whose repository `principal` may see, in their original order.
    ///
    /// `key` returns the repository an item belongs to; items without one are
    /// always kept. Checks run concurrently and the first lookup error aborts
    /// the whole batch.
    pub async fn filter_accessible<T, K>(
        &self,
        items: Vec<T>,
        principal: Option<Uuid>,
        key: K,
    ) -> AppResult<Vec<T>>
    where
        T: Send + 'static,
        K: Fn(&T) -> Option<Uuid>,
    {
        let keyed: Vec<(T, Option<Uuid>)> = items
            .into_iter()
            .map(|item| {
                let repository_id = key(&item);
                (item, repository_id)
            })
            .collect();

        let resolver = self.clone();
        let checked = parallel_map(keyed, self.batch_concurrency, move |(item, repository_id)| {
            let resolver = resolver.clone();
            async move {
                match repository_id {
                    None => Ok(Some(item)),
                    Some(id) => Ok(resolver.has_access(id, principal).await?.then_some(item)),
                }
            }
        })
        .await?;

        Ok(checked.into_iter().flatten().collect())
    }

    /// Whether `user_id` owns repository `repository_id`.
    pub async fn is_repo_owner(&self, repository_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        self.repositories.is_owner(repository_id, user_id).await
    }

    /// Fails with `Unauthorized` unless `user_id` owns the repository.
    pub async fn require_owner(&self, repository_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if self.is_repo_owner(repository_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::unauthorized(
                "You are not the owner of this repository",
            ))
        }
    }
}
