//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Duration;

use devhub_auth::{JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator};
use devhub_cache::CacheManager;
use devhub_core::config::AppConfig;
use devhub_core::traits::StorageProvider;
use devhub_database::Stores;
use devhub_service::{
    AccessResolver, ArchiveBuilder, AuthService, DiscussionService, RepositoryService, TreeEngine,
    UserService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Document stores
    pub stores: Stores,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// Object store for uploaded blobs
    pub storage: Arc<dyn StorageProvider>,

    // ── Services ─────────────────────────────────────────────
    /// Repository service
    pub repository_service: Arc<RepositoryService>,
    /// Discussion service
    pub discussion_service: Arc<DiscussionService>,
    /// User lookup service
    pub user_service: Arc<UserService>,
    /// Registration, login and token service
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires every service over the given infrastructure.
    pub fn build(
        config: AppConfig,
        stores: Stores,
        cache: Arc<CacheManager>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        let operation_timeout = Duration::from_secs(config.storage.operation_timeout_seconds);

        let access = AccessResolver::new(
            Arc::clone(&stores.repositories),
            config.access.batch_concurrency,
        );
        let tree = TreeEngine::new(
            Arc::clone(&stores.nodes),
            Arc::clone(&stores.repositories),
            Arc::clone(&storage),
            access.clone(),
            config.tree.max_depth,
            operation_timeout,
        );
        let archive = ArchiveBuilder::new(
            Arc::clone(&stores.nodes),
            Arc::clone(&storage),
            operation_timeout,
        );

        let repository_service = Arc::new(RepositoryService::new(
            Arc::clone(&stores.repositories),
            Arc::clone(&stores.users),
            Arc::clone(&stores.likes),
            access.clone(),
            tree,
            archive,
            Arc::clone(&cache),
            config.repository.clone(),
        ));
        let discussion_service = Arc::new(DiscussionService::new(
            Arc::clone(&stores.discussions),
            Arc::clone(&storage),
            access,
            config.access.discussion_page_size,
            operation_timeout,
        ));
        let user_service = Arc::new(UserService::new(Arc::clone(&stores.users)));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&stores.users),
            Arc::clone(&stores.tokens),
            Arc::new(PasswordHasher::new()),
            Arc::new(PasswordValidator::new(&config.auth)),
            Arc::new(JwtEncoder::new(&config.auth)),
            Arc::new(JwtDecoder::new(&config.auth, Arc::clone(&cache))),
            config.auth.clone(),
        ));

        Self {
            config: Arc::new(config),
            stores,
            cache,
            storage,
            repository_service,
            discussion_service,
            user_service,
            auth_service,
        }
    }
}
