//! In-memory wiring shared by the service tests.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use uuid::Uuid;

use devhub_auth::jwt::{JwtDecoder, JwtEncoder};
use devhub_auth::password::{PasswordHasher, PasswordValidator};
use devhub_cache::CacheManager;
use devhub_cache::memory::MemoryCacheProvider;
use devhub_core::config::{AppConfig, AuthConfig};
use devhub_database::Stores;
use devhub_database::store::{RepositoryStore, TokenStore, UserStore};
use devhub_entity::repository::{Access, NewRepository};
use devhub_entity::user::{NewUser, TokenPurpose, UserRole};
use devhub_storage::LocalStorageProvider;

use crate::access::AccessResolver;
use crate::archive::ArchiveBuilder;
use crate::auth::AuthService;
use crate::context::RequestContext;
use crate::discussion::DiscussionService;
use crate::repository::RepositoryService;
use crate::tree::TreeEngine;
use crate::user::UserService;

pub(crate) struct Fixture {
    pub stores: Stores,
    pub storage: Arc<LocalStorageProvider>,
    pub access: AccessResolver,
    pub tree: TreeEngine,
    pub archive: ArchiveBuilder,
    pub repositories: RepositoryService,
    pub discussions: DiscussionService,
    pub users: UserService,
    pub auth: AuthService,
    _dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(AppConfig::default()).await
    }

    pub async fn with_max_depth(max_depth: usize) -> Self {
        let mut config = AppConfig::default();
        config.tree.max_depth = max_depth;
        Self::build(config).await
    }

    pub async fn without_confirmation() -> Self {
        let mut config = AppConfig::default();
        config.auth.require_confirmation = false;
        Self::build(config).await
    }

    async fn build(mut config: AppConfig) -> Self {
        config.auth = AuthConfig {
            jwt_secret: "service-test-secret".into(),
            ..config.auth
        };
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(
            LocalStorageProvider::new(dir.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let stores = Stores::memory();
        let cache = Arc::new(CacheManager::from_provider(Arc::new(
            MemoryCacheProvider::new(&config.cache.memory),
        )));
        let timeout = Duration::from_secs(config.storage.operation_timeout_seconds);

        let access = AccessResolver::new(
            stores.repositories.clone(),
            config.access.batch_concurrency,
        );
        let tree = TreeEngine::new(
            stores.nodes.clone(),
            stores.repositories.clone(),
            storage.clone(),
            access.clone(),
            config.tree.max_depth,
            timeout,
        );
        let archive = ArchiveBuilder::new(stores.nodes.clone(), storage.clone(), timeout);
        let repositories = RepositoryService::new(
            stores.repositories.clone(),
            stores.users.clone(),
            stores.likes.clone(),
            access.clone(),
            tree.clone(),
            archive.clone(),
            cache.clone(),
            config.repository.clone(),
        );
        let discussions = DiscussionService::new(
            stores.discussions.clone(),
            storage.clone(),
            access.clone(),
            config.access.discussion_page_size,
            timeout,
        );
        let users = UserService::new(stores.users.clone());
        let auth = AuthService::new(
            stores.users.clone(),
            stores.tokens.clone(),
            Arc::new(PasswordHasher::new()),
            Arc::new(PasswordValidator::new(&config.auth)),
            Arc::new(JwtEncoder::new(&config.auth)),
            Arc::new(JwtDecoder::new(&config.auth, cache)),
            config.auth.clone(),
        );

        Self {
            stores,
            storage,
            access,
            tree,
            archive,
            repositories,
            discussions,
            users,
            auth,
            _dir: dir,
        }
    }

    /// Inserts an active user directly and returns its id.
    pub async fn user(&self, username: &str) -> Uuid {
        self.stores
            .users
            .create(&NewUser {
                full_name: username.to_string(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: String::new(),
                active: true,
                role: UserRole::User,
            })
            .await
            .unwrap()
            .id
    }

    /// Inserts a user and returns a request context for it.
    pub async fn ctx(&self, username: &str) -> RequestContext {
        let id = self.user(username).await;
        self.ctx_for(id, username)
    }

    pub fn ctx_for(&self, user_id: Uuid, username: &str) -> RequestContext {
        RequestContext::new(user_id, UserRole::User, username.to_string())
    }

    /// Inserts a repository directly and returns its id.
    pub async fn repository(&self, owner: Uuid, name: &str, access: Access) -> Uuid {
        self.stores
            .repositories
            .create(
                owner,
                &NewRepository {
                    name: name.to_string(),
                    description: String::new(),
                    access,
                },
            )
            .await
            .unwrap()
            .id
    }

    pub async fn confirmation_token_for(&self, user_id: Uuid) -> String {
        self.stores
            .tokens
            .find_by_user(user_id, TokenPurpose::ConfirmAccount)
            .await
            .unwrap()
            .pop()
            .unwrap()
            .token
    }
}
