//! Object store configuration.

use serde::{Deserialize, Serialize};

/// Object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding every uploaded blob.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Deadline in seconds for a single blob read or write.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

fn default_root_path() -> String {
    "./data/media".to_string()
}

fn default_operation_timeout() -> u64 {
    20
}
