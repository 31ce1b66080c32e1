//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use devhub_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built by the API layer from a verified access token and passed into
/// service methods so every operation knows *who* is acting. Endpoints
/// open to anonymous callers take an `Option<&RequestContext>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// The username (convenience field from the token claims).
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: UserRole, username: String) -> Self {
        Self {
            user_id,
            role,
            username,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The principal id of an optional context.
    pub fn principal(ctx: Option<&Self>) -> Option<Uuid> {
        ctx.map(|c| c.user_id)
    }
}
