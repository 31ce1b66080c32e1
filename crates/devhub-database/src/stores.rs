//! The bundle of store implementations handed to the services.

use std::sync::Arc;

use tracing::info;

use devhub_core::config::DatabaseConfig;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::postgres::{
    PgDiscussionStore, PgLikeStore, PgNodeStore, PgRepositoryStore, PgTokenStore, PgUserStore,
};
use crate::store::{
    DiscussionStore, LikeStore, NodeStore, RepositoryStore, TokenStore, UserStore,
};

/// One implementation of every store trait.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Repository documents.
    pub repositories: Arc<dyn RepositoryStore>,
    /// Tree nodes.
    pub nodes: Arc<dyn NodeStore>,
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// Likes.
    pub likes: Arc<dyn LikeStore>,
    /// Discussions.
    pub discussions: Arc<dyn DiscussionStore>,
    /// One-time tokens.
    pub tokens: Arc<dyn TokenStore>,
}

impl Stores {
    /// All stores backed by one shared [`MemoryStore`].
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            repositories: store.clone(),
            nodes: store.clone(),
            users: store.clone(),
            likes: store.clone(),
            discussions: store.clone(),
            tokens: store,
        }
    }

    /// All stores backed by a PostgreSQL pool.
    pub fn postgres(pool: &DatabasePool) -> Self {
        let pool = pool.pool().clone();
        Self {
            repositories: Arc::new(PgRepositoryStore::new(pool.clone())),
            nodes: Arc::new(PgNodeStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            likes: Arc::new(PgLikeStore::new(pool.clone())),
            discussions: Arc::new(PgDiscussionStore::new(pool.clone())),
            tokens: Arc::new(PgTokenStore::new(pool)),
        }
    }

    /// Build the stores selected by `config.provider`.
    ///
    /// For PostgreSQL this connects and runs pending migrations.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "memory" => {
                info!("Using in-memory document store");
                Ok(Self::memory())
            }
            "postgres" => {
                let pool = DatabasePool::connect(config).await?;
                crate::migration::run_migrations(pool.pool()).await?;
                Ok(Self::postgres(&pool))
            }
            other => Err(AppError::internal(format!(
                "Unknown database provider: '{other}'. Expected 'memory' or 'postgres'"
            ))),
        }
    }
}
