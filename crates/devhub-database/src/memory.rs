//! In-process document store.
//!
//! Every collection lives behind one lock, so the multi-document operations
//! (node create+link, subtree delete+unlink, cascading repository delete,
//! like toggle) are atomic exactly like their transactional counterparts.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_core::types::PageRequest;
use devhub_entity::discussion::Discussion;
use devhub_entity::like::{Like, star_delta};
use devhub_entity::repository::{Link, NewRepository, Repository, RepositoryAccess, RepositoryPatch};
use devhub_entity::system_file::{NewSystemFile, SystemFile};
use devhub_entity::user::{NewUser, NewUserToken, TokenPurpose, User, UserToken};

use crate::store::{
    DiscussionQuery, DiscussionStore, LikeStore, NodeStore, RepositoryQuery, RepositoryStore,
    TokenStore, UserStore,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    tokens: HashMap<Uuid, UserToken>,
    repositories: HashMap<Uuid, Repository>,
    nodes: HashMap<Uuid, SystemFile>,
    likes: HashMap<(Uuid, Uuid), Like>,
    discussions: HashMap<Uuid, Discussion>,
}

impl State {
    /// `root` and everything below it, following both `children` and
    /// `parent_id` links.
    fn subtree_ids(&self, root: Uuid) -> Vec<Uuid> {
        let mut ids = vec![root];
        let mut seen = HashSet::from([root]);
        let mut next = 0;

        while next < ids.len() {
            let id = ids[next];
            next += 1;
            let children = self
                .nodes
                .get(&id)
                .map(|n| n.children.clone())
                .unwrap_or_default();
            let linked = self
                .nodes
                .values()
                .filter(|n| n.parent_id == Some(id))
                .map(|n| n.id);
            for child in children.into_iter().chain(linked).collect::<Vec<_>>() {
                if seen.insert(child) {
                    ids.push(child);
                }
            }
        }
        ids
    }

    fn repository_mut(&mut self, id: Uuid) -> AppResult<&mut Repository> {
        self.repositories
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Repository {id} not found")))
    }
}

/// Document store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn push_unique(ids: &mut Vec<Uuid>, id: Uuid) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn page_of<T>(items: Vec<T>, page: &PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Repository>> {
        Ok(self.state.lock().await.repositories.get(&id).cloned())
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Repository>> {
        let state = self.state.lock().await;
        Ok(state
            .repositories
            .values()
            .find(|r| r.owner_id == owner_id && r.name == name)
            .cloned())
    }

    async fn find_access(&self, id: Uuid) -> AppResult<Option<RepositoryAccess>> {
        let state = self.state.lock().await;
        Ok(state.repositories.get(&id).map(Repository::access_info))
    }

    async fn is_owner(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .repositories
            .get(&id)
            .is_some_and(|r| r.owner_id == user_id))
    }

    async fn create(&self, owner_id: Uuid, data: &NewRepository) -> AppResult<Repository> {
        let mut state = self.state.lock().await;
        if state
            .repositories
            .values()
            .any(|r| r.owner_id == owner_id && r.name == data.name)
        {
            return Err(AppError::conflict(format!(
                "Repository '{}' already exists",
                data.name
            )));
        }

        let now = Utc::now();
        let repository = Repository {
            id: Uuid::new_v4(),
            owner_id,
            name: data.name.clone(),
            description: data.description.clone(),
            content: String::new(),
            access: data.access,
            custom_access: Vec::new(),
            system_files: Vec::new(),
            stars: 0,
            views: 0,
            downloads: 0,
            links: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.repositories.insert(repository.id, repository.clone());
        Ok(repository)
    }

    async fn list(
        &self,
        query: &RepositoryQuery,
        page: &PageRequest,
    ) -> AppResult<Vec<Repository>> {
        let state = self.state.lock().await;
        let mut items: Vec<Repository> = state
            .repositories
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.stars.cmp(&a.stars))
        });
        Ok(page_of(items, page))
    }

    async fn count(&self, query: &RepositoryQuery) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state.repositories.values().filter(|r| query.matches(r)).count() as u64)
    }

    async fn update(&self, id: Uuid, patch: &RepositoryPatch) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let repository = state.repository_mut(id)?;
        if let Some(description) = &patch.description {
            repository.description = description.clone();
        }
        if let Some(content) = &patch.content {
            repository.content = content.clone();
        }
        if let Some(access) = patch.access {
            repository.access = access;
        }
        if let Some(custom_access) = &patch.custom_access {
            repository.custom_access = custom_access.clone();
        }
        if let Some(tags) = &patch.tags {
            repository.tags = tags.clone();
        }
        repository.updated_at = patch.updated_at;
        Ok(())
    }

    async fn add_link(&self, id: Uuid, link: &Link) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.repository_mut(id)?.links.push(link.clone());
        Ok(())
    }

    async fn remove_link(&self, id: Uuid, link_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let links = &mut state.repository_mut(id)?.links;
        let before = links.len();
        links.retain(|l| l.id != link_id);
        Ok(links.len() != before)
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.repository_mut(id)?.views += 1;
        Ok(())
    }

    async fn increment_downloads(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.repository_mut(id)?.downloads += 1;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.repositories.remove(&id).is_none() {
            return Err(AppError::not_found(format!("Repository {id} not found")));
        }
        state.nodes.retain(|_, n| n.repository_id != id);
        state.likes.retain(|(_, repo), _| *repo != id);
        state.discussions.retain(|_, d| d.repository_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SystemFile>> {
        Ok(self.state.lock().await.nodes.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<SystemFile>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect())
    }

    async fn create_linked(&self, data: &NewSystemFile) -> AppResult<SystemFile> {
        let mut state = self.state.lock().await;
        let node = SystemFile {
            id: Uuid::new_v4(),
            repository_id: data.repository_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            is_directory: data.is_directory,
            mime_type: data.mime_type.clone(),
            blob_name: data.blob_name.clone(),
            children: Vec::new(),
            created_at: Utc::now(),
        };

        match data.parent_id {
            Some(parent_id) => {
                let parent = state
                    .nodes
                    .get_mut(&parent_id)
                    .ok_or_else(|| AppError::not_found(format!("Folder {parent_id} not found")))?;
                if !parent.is_directory {
                    return Err(AppError::bad_request(format!(
                        "Node {parent_id} is not a directory"
                    )));
                }
                push_unique(&mut parent.children, node.id);
            }
            None => {
                let repository = state.repository_mut(data.repository_id)?;
                push_unique(&mut repository.system_files, node.id);
            }
        }

        state.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn delete_subtree(
        &self,
        repository_id: Uuid,
        node_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        if !state.nodes.contains_key(&node_id) {
            return Err(AppError::not_found(format!("Element {node_id} not found")));
        }

        let ids = state.subtree_ids(node_id);
        match parent_id {
            Some(parent_id) => {
                if let Some(parent) = state.nodes.get_mut(&parent_id) {
                    parent.children.retain(|c| *c != node_id);
                }
            }
            None => {
                state
                    .repository_mut(repository_id)?
                    .system_files
                    .retain(|c| *c != node_id);
            }
        }
        for id in &ids {
            state.nodes.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn blob_names(&self) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .nodes
            .values()
            .filter_map(|n| n.blob_name.clone())
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == data.email) {
            return Err(AppError::conflict("E-mail is already registered"));
        }
        if state.users.values().any(|u| u.username == data.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' is taken",
                data.username
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name: data.full_name.clone(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            active: data.active,
            role: data.role,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn activate(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.active = true;
        Ok(())
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn find(&self, user_id: Uuid, repository_id: Uuid) -> AppResult<Option<Like>> {
        let state = self.state.lock().await;
        Ok(state.likes.get(&(user_id, repository_id)).cloned())
    }

    async fn toggle(&self, user_id: Uuid, repository_id: Uuid, plus: bool) -> AppResult<i64> {
        let mut state = self.state.lock().await;
        if !state.repositories.contains_key(&repository_id) {
            return Err(AppError::not_found(format!(
                "Repository {repository_id} not found"
            )));
        }

        let previous = state.likes.get(&(user_id, repository_id)).map(|l| l.plus);
        let delta = star_delta(previous, plus);

        state
            .likes
            .entry((user_id, repository_id))
            .and_modify(|l| l.plus = plus)
            .or_insert_with(|| Like {
                user_id,
                repository_id,
                plus,
                created_at: Utc::now(),
            });

        let repository = state.repository_mut(repository_id)?;
        repository.stars += delta;
        Ok(repository.stars)
    }
}

#[async_trait]
impl DiscussionStore for MemoryStore {
    async fn insert(&self, discussion: &Discussion) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.discussions.values().any(|d| d.code == discussion.code) {
            return Err(AppError::conflict("Discussion code already in use"));
        }
        state.discussions.insert(discussion.id, discussion.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Discussion>> {
        let state = self.state.lock().await;
        Ok(state
            .discussions
            .values()
            .find(|d| d.code == code)
            .cloned())
    }

    async fn list(
        &self,
        query: &DiscussionQuery,
        page: &PageRequest,
    ) -> AppResult<Vec<Discussion>> {
        let state = self.state.lock().await;
        let mut items: Vec<Discussion> = state
            .discussions
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(items, page))
    }

    async fn image_names(&self) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .discussions
            .values()
            .filter_map(|d| d.image.clone())
            .collect())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn create(&self, data: &NewUserToken) -> AppResult<UserToken> {
        let mut state = self.state.lock().await;
        let token = UserToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token: data.token.clone(),
            purpose: data.purpose,
            expires_at: data.expires_at,
        };
        state.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_valid(
        &self,
        token: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UserToken>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .values()
            .find(|t| t.token == token && t.purpose == purpose && !t.is_expired_at(now))
            .cloned())
    }

    async fn find_by_user(&self, user_id: Uuid, purpose: TokenPurpose) -> AppResult<Vec<UserToken>> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && t.purpose == purpose)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.state.lock().await.tokens.remove(&id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - state.tokens.len()) as u64)
    }
}
