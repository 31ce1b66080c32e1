//! Repository likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's vote on a repository. `(user_id, repository_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Like {
    /// Voting user.
    pub user_id: Uuid,
    /// Target repository.
    pub repository_id: Uuid,
    /// Up (true) or down (false).
    pub plus: bool,
    /// When the vote was first cast.
    pub created_at: DateTime<Utc>,
}

/// Star delta caused by moving from `previous` to `plus`.
///
/// A new vote counts once, a flip counts twice, and repeating the same
/// vote changes nothing.
pub fn star_delta(previous: Option<bool>, plus: bool) -> i64 {
    let sign = if plus { 1 } else { -1 };
    match previous {
        None => sign,
        Some(prev) if prev == plus => 0,
        Some(_) => 2 * sign,
    }
}
