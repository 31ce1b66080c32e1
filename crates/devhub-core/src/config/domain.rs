//! Repository, access resolver, and file tree settings.

use serde::{Deserialize, Serialize};

/// Repository listing and accounting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repositories per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Window in hours during which repeated views by one principal count once.
    #[serde(default = "default_view_window")]
    pub view_window_hours: u64,
    /// Concurrent username lookups when updating a group allow-list.
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            view_window_hours: default_view_window(),
            resolve_concurrency: default_resolve_concurrency(),
        }
    }
}

/// Access resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Concurrent access checks when filtering a listing page.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Discussions per listing page.
    #[serde(default = "default_discussion_page_size")]
    pub discussion_page_size: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: default_batch_concurrency(),
            discussion_page_size: default_discussion_page_size(),
        }
    }
}

/// File tree guards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of ancestor hops before a walk fails closed.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_page_size() -> u64 {
    20
}

fn default_view_window() -> u64 {
    5
}

fn default_resolve_concurrency() -> usize {
    10
}

fn default_batch_concurrency() -> usize {
    5
}

fn default_discussion_page_size() -> u64 {
    15
}

fn default_max_depth() -> usize {
    64
}
