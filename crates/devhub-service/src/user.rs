//! Public user profiles.

use std::sync::Arc;

use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_database::store::UserStore;
use devhub_entity::user::UserSummary;

/// Looks up users for public display.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User store.
    users: Arc<dyn UserStore>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// The public summary of `username`.
    pub async fn get_user(&self, username: &str) -> AppResult<UserSummary> {
        self.users
            .find_by_username(username)
            .await?
            .map(|u| u.summary())
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }
}
