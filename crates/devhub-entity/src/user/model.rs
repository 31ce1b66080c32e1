//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::role::UserRole;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Full display name.
    pub full_name: String,
    /// Unique public handle.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account has been confirmed.
    pub active: bool,
    /// Account role.
    pub role: UserRole,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public summary of this user.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Public projection of a user, joined into repository and discussion views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    /// User identifier.
    pub id: Uuid,
    /// Public handle.
    pub username: String,
    /// Full display name.
    pub full_name: String,
}

/// Data required to create a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
    /// Full display name.
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
    /// Public handle.
    #[validate(
        length(min = 1, max = 100, message = "Username must be 1-100 characters"),
        custom(function = "crate::validation::slug")
    )]
    pub username: String,
    /// E-mail address.
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account starts confirmed.
    pub active: bool,
    /// Account role.
    pub role: UserRole,
}
