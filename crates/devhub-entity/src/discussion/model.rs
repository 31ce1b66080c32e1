//! Discussion entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A discussion post, optionally attached to a repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discussion {
    /// Internal identifier.
    pub id: Uuid,
    /// Public handle (16 random bytes, hex).
    pub code: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub text: String,
    /// Optional code snippet.
    pub snippet: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Author.
    pub owner_id: Uuid,
    /// Repository the post is attached to.
    pub repository_id: Option<Uuid>,
    /// Object store name of the attached image.
    pub image: Option<String>,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to publish a discussion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewDiscussion {
    /// Title.
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    /// Body text.
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    /// Optional code snippet.
    pub snippet: Option<String>,
    /// Tags.
    #[validate(custom(function = "crate::validation::tags"))]
    #[serde(default)]
    pub tags: Vec<String>,
    /// Repository to attach to.
    pub repository_id: Option<Uuid>,
}
