//! Virtual filesystem tree of a repository.
//!
//! Nodes carry a `parent_id` back-reference and directories an ordered
//! `children` list. The repository's `system_files` holds the top-level
//! nodes. Membership is always re-derived by walking back-references, so a
//! node id taken from a request is never trusted on its own.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use devhub_core::concurrency::with_deadline;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_core::traits::StorageProvider;
use devhub_database::store::{NodeStore, RepositoryStore};
use devhub_entity::system_file::{NewSystemFile, SystemFile, sort_listing};
use devhub_entity::validation::ValidateExt;
use devhub_storage::{blob_name, mime_from_path};

use crate::access::AccessResolver;

/// Form fields of a node upload.
#[derive(Debug, Clone, Default)]
pub struct NodeForm {
    /// Directory name. Ignored for files, which take the uploaded file name.
    pub name: String,
    /// Whether the node is a directory.
    pub is_directory: bool,
}

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// File contents.
    pub data: Bytes,
}

/// Creates, walks and deletes tree nodes.
#[derive(Debug, Clone)]
pub struct TreeEngine {
    /// Node store.
    nodes: Arc<dyn NodeStore>,
    /// Repository store.
    repositories: Arc<dyn RepositoryStore>,
    /// Object store for file contents.
    storage: Arc<dyn StorageProvider>,
    /// Ownership checks.
    access: AccessResolver,
    /// Maximum ancestor hops before a walk fails closed.
    max_depth: usize,
    /// Deadline for one blob write.
    operation_timeout: Duration,
}

impl TreeEngine {
    /// Creates a new tree engine.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        repositories: Arc<dyn RepositoryStore>,
        storage: Arc<dyn StorageProvider>,
        access: AccessResolver,
        max_depth: usize,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            nodes,
            repositories,
            storage,
            access,
            max_depth,
            operation_timeout,
        }
    }

    /// Loads a node or fails with `NotFound`.
    pub async fn get_node(&self, node_id: Uuid) -> AppResult<SystemFile> {
        self.nodes
            .find_by_id(node_id)
            .await?
            .ok_or_else(|| AppError::not_found("Element not found"))
    }

    /// Creates a node under `parent_id`, or at the top level when it is `None`.
    ///
    /// Ownership of the repository is the caller's responsibility.
    pub async fn create_node(
        &self,
        repository_id: Uuid,
        parent_id: Option<Uuid>,
        form: NodeForm,
        file: Option<UploadedFile>,
    ) -> AppResult<SystemFile> {
        if let Some(parent_id) = parent_id {
            let parent = self.get_node(parent_id).await?;
            if !parent.is_directory {
                return Err(AppError::bad_request("Parent element is not a directory"));
            }
            if !self.is_in_repository(&parent, repository_id).await? {
                return Err(AppError::unauthorized(
                    "Parent element does not belong to this repository",
                ));
            }
        }

        let mut data = NewSystemFile {
            repository_id,
            parent_id,
            name: form.name.trim().to_string(),
            is_directory: form.is_directory,
            mime_type: None,
            blob_name: None,
        };

        let upload = if form.is_directory {
            None
        } else {
            let file = file.ok_or_else(|| AppError::bad_request("A file is required"))?;
            let name = blob_name(&file.file_name);
            data.name = file.file_name.clone();
            data.mime_type = Some(mime_from_path(&file.file_name));
            data.blob_name = Some(name.clone());
            Some((name, file.data))
        };
        data.validate_input()?;

        if let Some((name, bytes)) = upload {
            with_deadline(
                self.operation_timeout,
                "Blob upload",
                self.storage.write(&name, bytes),
            )
            .await?;
        }

        let node = self.nodes.create_linked(&data).await?;

        info!(
            repository_id = %repository_id,
            node_id = %node.id,
            parent_id = ?parent_id,
            is_directory = node.is_directory,
            "Element created"
        );

        Ok(node)
    }

    /// Whether `node` hangs, through its ancestors, off repository `repository_id`.
    ///
    /// A cycle, a walk longer than the depth limit, or a dangling parent
    /// reference fails with `NotFound` rather than answering either way.
    pub async fn is_in_repository(&self, node: &SystemFile, repository_id: Uuid) -> AppResult<bool> {
        let mut visited = HashSet::from([node.id]);
        let mut root_id = node.id;
        let mut parent_id = node.parent_id;

        while let Some(id) = parent_id {
            if visited.len() > self.max_depth {
                return Err(AppError::not_found("Element is nested too deeply"));
            }
            if !visited.insert(id) {
                return Err(AppError::not_found("Element tree contains a cycle"));
            }
            let parent = self
                .nodes
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found("Parent element not found"))?;
            root_id = parent.id;
            parent_id = parent.parent_id;
        }

        let repository = self
            .repositories
            .find_by_id(repository_id)
            .await?
            .ok_or_else(|| AppError::not_found("Repository not found"))?;

        Ok(repository.system_files.contains(&root_id))
    }

    /// Deletes a node and its whole subtree.
    ///
    /// Blobs stay in the object store until the orphan sweep reclaims them.
    pub async fn delete_element(
        &self,
        repository_id: Uuid,
        node_id: Uuid,
        requester: Uuid,
    ) -> AppResult<()> {
        self.access.require_owner(repository_id, requester).await?;

        let node = self.get_node(node_id).await?;
        if !self.is_in_repository(&node, repository_id).await? {
            return Err(AppError::unauthorized(
                "Element does not belong to this repository",
            ));
        }

        let deleted = self
            .nodes
            .delete_subtree(repository_id, node.id, node.parent_id)
            .await?;

        info!(
            repository_id = %repository_id,
            node_id = %node_id,
            deleted,
            "Element deleted"
        );

        Ok(())
    }

    /// Loads `ids` as a listing: directories first, then by name.
    pub async fn listing(&self, ids: &[Uuid]) -> AppResult<Vec<SystemFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut nodes = self.nodes.find_many(ids).await?;
        sort_listing(&mut nodes);
        Ok(nodes)
    }

    /// Immediate children of a directory that belongs to `repository_id`.
    pub async fn folder_children(
        &self,
        repository_id: Uuid,
        folder_id: Uuid,
    ) -> AppResult<Vec<SystemFile>> {
        let folder = self.get_node(folder_id).await?;
        if !folder.is_directory {
            return Err(AppError::bad_request("Element is not a directory"));
        }
        if !self.is_in_repository(&folder, repository_id).await? {
            return Err(AppError::not_found("Folder not found in this repository"));
        }
        self.listing(&folder.children).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devhub_core::error::ErrorKind;
    use devhub_entity::repository::Access;

    use crate::testing::Fixture;

    fn dir(name: &str) -> NodeForm {
        NodeForm {
            name: name.to_string(),
            is_directory: true,
        }
    }

    fn file(name: &str, body: &'static str) -> Option<UploadedFile> {
        Some(UploadedFile {
            file_name: name.to_string(),
            data: Bytes::from_static(body.as_bytes()),
        })
    }

    #[tokio::test]
    async fn test_transitive_membership() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "deep", Access::Public).await;
        let other = fx.repository(owner, "other", Access::Public).await;

        let mut parent = None;
        for level in 0..10 {
            let node = fx
                .tree
                .create_node(repo, parent, dir(&format!("level{level}")), None)
                .await
                .unwrap();
            parent = Some(node.id);
        }
        let leaf = fx
            .tree
            .create_node(repo, parent, NodeForm::default(), file("leaf.txt", "x"))
            .await
            .unwrap();

        assert!(fx.tree.is_in_repository(&leaf, repo).await.unwrap());
        assert!(!fx.tree.is_in_repository(&leaf, other).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_node_takes_upload_name() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "files", Access::Public).await;

        let node = fx
            .tree
            .create_node(repo, None, dir("ignored"), None)
            .await
            .unwrap();
        assert_eq!(node.name, "ignored");

        let node = fx
            .tree
            .create_node(
                repo,
                None,
                NodeForm {
                    name: "ignored".into(),
                    is_directory: false,
                },
                file("Main.RS", "fn main() {}"),
            )
            .await
            .unwrap();
        assert_eq!(node.name, "Main.RS");
        assert_eq!(node.mime_type.as_deref(), Some("text/x-rust"));
        let blob = node.blob_name.unwrap();
        assert!(blob.ends_with(".rs"));
        assert!(fx.storage.exists(&blob).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_node_rejects_bad_parents() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "tree", Access::Public).await;
        let foreign = fx.repository(owner, "foreign", Access::Public).await;

        let err = fx
            .tree
            .create_node(repo, Some(Uuid::new_v4()), dir("x"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let leaf = fx
            .tree
            .create_node(repo, None, NodeForm::default(), file("a.txt", "a"))
            .await
            .unwrap();
        let err = fx
            .tree
            .create_node(repo, Some(leaf.id), dir("x"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);

        let elsewhere = fx.tree.create_node(foreign, None, dir("d"), None).await.unwrap();
        let err = fx
            .tree
            .create_node(repo, Some(elsewhere.id), dir("x"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let err = fx
            .tree
            .create_node(repo, None, NodeForm::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_the_subtree() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "prune", Access::Public).await;

        let keep = fx.tree.create_node(repo, None, dir("keep"), None).await.unwrap();
        let doomed = fx.tree.create_node(repo, Some(keep.id), dir("doomed"), None).await.unwrap();
        let sibling = fx
            .tree
            .create_node(repo, Some(keep.id), NodeForm::default(), file("s.txt", "s"))
            .await
            .unwrap();
        let inner = fx.tree.create_node(repo, Some(doomed.id), dir("inner"), None).await.unwrap();
        let leaf = fx
            .tree
            .create_node(repo, Some(inner.id), NodeForm::default(), file("l.txt", "l"))
            .await
            .unwrap();

        fx.tree.delete_element(repo, doomed.id, owner).await.unwrap();

        for gone in [doomed.id, inner.id, leaf.id] {
            assert!(NodeStore::find_by_id(fx.stores.nodes.as_ref(), gone).await.unwrap().is_none());
        }
        let keep = fx.tree.get_node(keep.id).await.unwrap();
        assert_eq!(keep.children, vec![sibling.id]);
        assert!(fx.tree.get_node(sibling.id).await.is_ok());

        let repository = RepositoryStore::find_by_id(fx.stores.repositories.as_ref(), repo)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repository.system_files, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_delete_takes_nodes_added_after_the_lookup() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "racy", Access::Public).await;

        let outer = fx.tree.create_node(repo, None, dir("outer"), None).await.unwrap();
        let inner = fx.tree.create_node(repo, Some(outer.id), dir("inner"), None).await.unwrap();

        // The node as a deleting request saw it, before a concurrent upload lands.
        let seen = fx.tree.get_node(outer.id).await.unwrap();
        let late = fx
            .tree
            .create_node(repo, Some(inner.id), NodeForm::default(), file("late.txt", "late"))
            .await
            .unwrap();

        let deleted = fx
            .stores
            .nodes
            .delete_subtree(repo, seen.id, seen.parent_id)
            .await
            .unwrap();
        assert_eq!(deleted, 3);

        assert!(NodeStore::find_by_id(fx.stores.nodes.as_ref(), late.id).await.unwrap().is_none());
        let referenced = fx.stores.nodes.blob_names().await.unwrap();
        assert!(!referenced.contains(late.blob_name.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn test_delete_top_level_unlinks_repository() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "top", Access::Public).await;
        let a = fx.tree.create_node(repo, None, dir("a"), None).await.unwrap();
        let b = fx.tree.create_node(repo, None, dir("b"), None).await.unwrap();

        fx.tree.delete_element(repo, a.id, owner).await.unwrap();

        let repository = RepositoryStore::find_by_id(fx.stores.repositories.as_ref(), repo)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repository.system_files, vec![b.id]);
    }

    #[tokio::test]
    async fn test_delete_requires_owner_and_membership() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let intruder = fx.user("intruder").await;
        let repo = fx.repository(owner, "guarded", Access::Public).await;
        let theirs = fx.repository(intruder, "theirs", Access::Public).await;
        let node = fx.tree.create_node(repo, None, dir("d"), None).await.unwrap();

        let err = fx.tree.delete_element(repo, node.id, intruder).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        // Owning some repository does not allow deleting nodes of another.
        let err = fx.tree.delete_element(theirs, node.id, intruder).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let err = fx
            .tree
            .delete_element(repo, Uuid::new_v4(), owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cycle_fails_closed() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "loop", Access::Public).await;

        let a = fx.tree.create_node(repo, None, dir("a"), None).await.unwrap();
        let b = fx.tree.create_node(repo, Some(a.id), dir("b"), None).await.unwrap();

        // A node whose ancestors loop back onto themselves.
        let mut looped = b.clone();
        looped.id = Uuid::new_v4();
        looped.parent_id = Some(looped.id);
        let err = fx.tree.is_in_repository(&looped, repo).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let mut orphan = b.clone();
        orphan.parent_id = Some(Uuid::new_v4());
        let err = fx.tree.is_in_repository(&orphan, repo).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_depth_limit_fails_closed() {
        let fx = Fixture::with_max_depth(3).await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "tall", Access::Public).await;

        let mut parent = None;
        let mut last = None;
        for level in 0..5 {
            let node = fx
                .tree
                .create_node(repo, parent, dir(&format!("d{level}")), None)
                .await;
            match node {
                Ok(node) => {
                    parent = Some(node.id);
                    last = Some(node);
                }
                Err(err) => {
                    assert_eq!(err.kind, ErrorKind::NotFound);
                    return;
                }
            }
        }
        let err = fx
            .tree
            .is_in_repository(&last.unwrap(), repo)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_folder_children_sorted() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner").await;
        let repo = fx.repository(owner, "sorted", Access::Public).await;
        let root = fx.tree.create_node(repo, None, dir("root"), None).await.unwrap();
        fx.tree
            .create_node(repo, Some(root.id), NodeForm::default(), file("b.txt", "b"))
            .await
            .unwrap();
        fx.tree.create_node(repo, Some(root.id), dir("z"), None).await.unwrap();
        fx.tree
            .create_node(repo, Some(root.id), NodeForm::default(), file("a.txt", "a"))
            .await
            .unwrap();

        let names: Vec<_> = fx
            .tree
            .folder_children(repo, root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["z", "a.txt", "b.txt"]);
    }
}
