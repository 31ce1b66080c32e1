//! One-time user tokens (account confirmation).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a user token may be redeemed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Activates a freshly registered account.
    ConfirmAccount,
}

/// A stored one-time token.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserToken {
    /// Token row identifier.
    pub id: Uuid,
    /// The user the token belongs to.
    pub user_id: Uuid,
    /// Opaque random token value.
    #[serde(skip_serializing)]
    pub token: String,
    /// What the token is for.
    pub purpose: TokenPurpose,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

impl UserToken {
    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Data required to issue a token.
#[derive(Debug, Clone)]
pub struct NewUserToken {
    /// Owner of the token.
    pub user_id: Uuid,
    /// Opaque random token value.
    pub token: String,
    /// Purpose.
    pub purpose: TokenPurpose,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}
