//! Repository entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::access::{Access, RepositoryAccess};
use super::link::Link;

/// A published project bundle with a virtual file tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Repository {
    /// Unique repository identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Name, unique per owner.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Free-text readme.
    pub content: String,
    /// Visibility tier.
    pub access: Access,
    /// Allow-list for the group tier.
    pub custom_access: Vec<Uuid>,
    /// Ordered top-level node ids.
    pub system_files: Vec<Uuid>,
    /// Net like count.
    pub stars: i64,
    /// View counter.
    pub views: i64,
    /// Download counter.
    pub downloads: i64,
    /// External links.
    #[sqlx(json)]
    pub links: Vec<Link>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// When the repository was created.
    pub created_at: DateTime<Utc>,
    /// When the repository was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    /// The access-relevant projection of this repository.
    pub fn access_info(&self) -> RepositoryAccess {
        RepositoryAccess {
            owner_id: self.owner_id,
            access: self.access,
            custom_access: self.custom_access.clone(),
        }
    }
}

/// Data required to create a repository.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewRepository {
    /// Name, `[0-9a-z_]+`.
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "crate::validation::repository_name")
    )]
    pub name: String,
    /// Short description.
    #[validate(length(max = 300, message = "Description must be at most 300 characters"))]
    #[serde(default)]
    pub description: String,
    /// Visibility tier.
    #[serde(default)]
    pub access: Access,
}

/// Owner-supplied changes to a repository.
///
/// `custom_access` holds usernames; the service resolves them to ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RepositoryUpdate {
    /// New description (ignored when empty).
    #[validate(length(max = 300, message = "Description must be at most 300 characters"))]
    pub description: Option<String>,
    /// New readme (ignored when empty).
    pub content: Option<String>,
    /// New visibility tier.
    pub access: Option<Access>,
    /// Usernames for the group allow-list.
    pub custom_access: Option<Vec<String>>,
    /// Replacement tag list.
    #[validate(custom(function = "crate::validation::tags"))]
    pub tags: Option<Vec<String>>,
}

/// Resolved changes handed to the store. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RepositoryPatch {
    /// New description.
    pub description: Option<String>,
    /// New readme.
    pub content: Option<String>,
    /// New visibility tier.
    pub access: Option<Access>,
    /// New allow-list.
    pub custom_access: Option<Vec<Uuid>>,
    /// New tags.
    pub tags: Option<Vec<String>>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}
