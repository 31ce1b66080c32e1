//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the orphaned-blob sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Cron expression for expired-token cleanup.
    #[serde(default = "default_token_cleanup_cron")]
    pub token_cleanup_cron: String,
    /// Concurrent blob deletions during a sweep.
    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_cron: default_sweep_cron(),
            token_cleanup_cron: default_token_cleanup_cron(),
            sweep_concurrency: default_sweep_concurrency(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_token_cleanup_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_sweep_concurrency() -> usize {
    10
}
