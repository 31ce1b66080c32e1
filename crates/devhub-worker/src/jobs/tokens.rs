//! Expired one-time token cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use devhub_database::store::TokenStore;

use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Deletes confirmation tokens whose expiry has passed
#[derive(Debug)]
pub struct TokenCleanupHandler {
    tokens: Arc<dyn TokenStore>,
}

impl TokenCleanupHandler {
    /// Create a new token cleanup handler
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl JobHandler for TokenCleanupHandler {
    fn job_type(&self) -> &str {
        "token_cleanup"
    }

    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError> {
        let deleted = self.tokens.delete_expired(Utc::now()).await?;

        tracing::info!(run_id = %run.id, "Token cleanup: {} expired tokens removed", deleted);

        Ok(serde_json::json!({
            "task": "token_cleanup",
            "deleted": deleted,
        }))
    }
}
