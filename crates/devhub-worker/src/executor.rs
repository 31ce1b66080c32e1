//! Job executor: dispatches runs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing;
use uuid::Uuid;

use devhub_core::error::AppError;

/// One execution of a job.
#[derive(Debug, Clone)]
pub struct JobRun {
    /// Run identifier, for correlating log lines.
    pub id: Uuid,
    /// Handler type this run dispatches to.
    pub job_type: String,
    /// When the run was triggered.
    pub started_at: DateTime<Utc>,
}

impl JobRun {
    /// A fresh run of `job_type`.
    pub fn new(job_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            started_at: Utc::now(),
        }
    }
}

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes
    fn job_type(&self) -> &str;

    /// Execute one run, returning a summary of what was done
    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, retrying will not help
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches runs to the appropriate handler based on job type
#[derive(Debug)]
pub struct JobExecutor {
    /// Registered job handlers by type
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job handler
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!("Registered job handler for type '{}'", job_type);
        self.handlers.insert(job_type, handler);
    }

    /// Run the handler registered for `job_type`
    pub async fn execute(&self, job_type: &str) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{job_type}'"
            ))
        })?;

        let run = JobRun::new(job_type);
        tracing::info!(run_id = %run.id, job_type = %run.job_type, "Executing job");

        let started = Instant::now();
        let result = handler.execute(&run).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(summary) => tracing::info!(
                run_id = %run.id,
                job_type = %run.job_type,
                duration_ms,
                summary = %summary,
                "Job completed"
            ),
            Err(e) => tracing::error!(
                run_id = %run.id,
                job_type = %run.job_type,
                duration_ms,
                error = %e,
                "Job failed"
            ),
        }

        result
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get the list of registered job types
    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

impl Default for JobExecutor {
    fn default() -> Self {
        Self::new()
    }
}
