//! Scheduled maintenance for DevHub.
//!
//! This crate provides:
//! - A job executor that dispatches a run to the handler registered for its type
//! - A cron scheduler that triggers the executor on the configured schedules
//! - The built-in jobs: expired-token cleanup and the orphaned-blob sweep

pub mod executor;
pub mod jobs;
pub mod scheduler;

use std::sync::Arc;

use devhub_core::config::WorkerConfig;
use devhub_core::traits::StorageProvider;
use devhub_database::Stores;

pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobRun};
pub use jobs::{OrphanSweepHandler, TokenCleanupHandler};
pub use scheduler::CronScheduler;

/// An executor with every built-in job registered.
pub fn default_executor(
    stores: &Stores,
    storage: Arc<dyn StorageProvider>,
    config: &WorkerConfig,
) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(TokenCleanupHandler::new(stores.tokens.clone())));
    executor.register(Arc::new(OrphanSweepHandler::new(
        stores.nodes.clone(),
        stores.discussions.clone(),
        storage,
        config.sweep_concurrency,
    )));
    executor
}
