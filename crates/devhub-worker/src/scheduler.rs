//! Cron-based scheduler for recurring maintenance jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use devhub_core::config::WorkerConfig;
use devhub_core::error::AppError;

use crate::executor::JobExecutor;

/// Triggers registered jobs on their cron schedules
pub struct CronScheduler {
    /// The underlying tokio-cron-scheduler
    scheduler: JobScheduler,
    /// Executor the scheduled runs dispatch to
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("executor", &self.executor)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register every built-in job on its configured schedule
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register("token_cleanup", &config.token_cleanup_cron)
            .await?;
        self.register("orphan_sweep", &config.sweep_cron).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run the handler for `job_type` whenever `cron` fires
    pub async fn register(&self, job_type: &str, cron: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::internal(format!(
                "Cannot schedule '{}': no handler registered",
                job_type
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                tracing::debug!("Running scheduled job '{}'", name);
                // Failures are logged by the executor; the next tick retries.
                let _ = executor.execute(&name).await;
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create {} schedule: {}", job_type, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", job_type, e))
        })?;

        tracing::info!("Registered: {} ({})", job_type, cron);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler stopped");
        Ok(())
    }
}
