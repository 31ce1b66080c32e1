//! External links attached to a repository.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Where a link points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Cloud drive folder.
    Drive,
    /// GitHub project.
    Github,
    /// Other cloud hosting.
    Cloud,
    /// PDF document.
    Pdf,
    /// YouTube video.
    Youtube,
    /// Anything else.
    Other,
}

/// A stored link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link identifier.
    pub id: Uuid,
    /// Link kind.
    #[serde(rename = "type")]
    pub kind: LinkKind,
    /// Short title.
    pub title: String,
    /// Target URL.
    pub url: String,
}

/// Data required to add a link.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLink {
    /// Link kind.
    #[serde(rename = "type")]
    pub kind: LinkKind,
    /// Short title.
    #[validate(length(min = 1, max = 30, message = "Title must be 1-30 characters"))]
    pub title: String,
    /// Target URL.
    #[validate(custom(function = "crate::validation::http_url"))]
    pub url: String,
}

impl NewLink {
    /// Turn the input into a stored link with a fresh id.
    pub fn into_link(self) -> Link {
        Link {
            id: Uuid::new_v4(),
            kind: self.kind,
            title: self.title,
            url: self.url,
        }
    }
}
