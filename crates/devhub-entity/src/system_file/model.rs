//! System file (tree node) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A file or directory inside a repository tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemFile {
    /// Unique node identifier.
    pub id: Uuid,
    /// Repository the node was created in.
    pub repository_id: Uuid,
    /// Parent directory (None for top-level nodes).
    pub parent_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Directory flag.
    pub is_directory: bool,
    /// MIME type of a file node.
    pub mime_type: Option<String>,
    /// Object store name of a file node.
    #[serde(skip_serializing)]
    pub blob_name: Option<String>,
    /// Ordered child ids of a directory.
    pub children: Vec<Uuid>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
}

impl SystemFile {
    /// Whether this node sits directly under the repository.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a node.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSystemFile {
    /// Owning repository.
    pub repository_id: Uuid,
    /// Parent directory.
    pub parent_id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Directory flag.
    pub is_directory: bool,
    /// MIME type of a file node.
    pub mime_type: Option<String>,
    /// Object store name of a file node.
    pub blob_name: Option<String>,
}

/// Sort a listing by name, with directories ahead of files.
pub fn sort_listing(nodes: &mut [SystemFile]) {
    nodes.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.cmp(&b.name))
    });
}
