//! Request DTOs with serde derives.

use serde::Deserialize;
use uuid::Uuid;

/// Login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// E-mail address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// `?token=` on the confirmation link.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmQuery {
    /// Confirmation token.
    pub token: String,
}

/// Like toggle body.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeRequest {
    /// `true` for a like, `false` for a dislike.
    pub plus: bool,
}

/// Query of the repository listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryListQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Name or tag substring.
    pub search: Option<String>,
    /// Whether to count the total.
    #[serde(default)]
    pub total: bool,
}

/// Query of the discussion listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscussionListQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Only discussions attached to this repository.
    pub repository: Option<Uuid>,
    /// Title substring.
    pub search: Option<String>,
}

/// `?parent=` of an element upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementQuery {
    /// Parent directory; the top level when absent.
    pub parent: Option<Uuid>,
}

/// `?child=` of a download.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    /// Element to archive instead of the whole repository.
    pub child: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}
