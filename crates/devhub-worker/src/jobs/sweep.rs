//! Orphaned-blob sweep.
//!
//! A blob is orphaned when no file node and no discussion image names it.
//! Such blobs are left behind by uploads whose metadata write failed and by
//! subtree deletes. Storage is listed before references are read, so a blob
//! written between the two steps may survive until the next run but is
//! never removed while referenced.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use devhub_core::concurrency::parallel_map;
use devhub_core::traits::StorageProvider;
use devhub_database::store::{DiscussionStore, NodeStore};

use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Deletes stored blobs that nothing references
#[derive(Debug)]
pub struct OrphanSweepHandler {
    nodes: Arc<dyn NodeStore>,
    discussions: Arc<dyn DiscussionStore>,
    storage: Arc<dyn StorageProvider>,
    concurrency: usize,
}

impl OrphanSweepHandler {
    /// Create a new sweep handler
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        discussions: Arc<dyn DiscussionStore>,
        storage: Arc<dyn StorageProvider>,
        concurrency: usize,
    ) -> Self {
        Self {
            nodes,
            discussions,
            storage,
            concurrency,
        }
    }
}

#[async_trait]
impl JobHandler for OrphanSweepHandler {
    fn job_type(&self) -> &str {
        "orphan_sweep"
    }

    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError> {
        let stored = self
            .storage
            .list()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Listing storage failed: {e}")))?;
        let scanned = stored.len();

        let mut referenced: HashSet<String> = self.nodes.blob_names().await?.into_iter().collect();
        referenced.extend(self.discussions.image_names().await?);

        let orphans: Vec<String> = stored
            .into_iter()
            .filter(|name| !referenced.contains(name))
            .collect();
        let orphan_count = orphans.len();

        let storage = Arc::clone(&self.storage);
        let run_id = run.id;
        let outcomes = parallel_map(orphans, self.concurrency, move |name| {
            let storage = Arc::clone(&storage);
            async move {
                match storage.delete(&name).await {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        tracing::warn!(%run_id, blob = %name, error = %e, "Failed to delete orphaned blob");
                        Ok(false)
                    }
                }
            }
        })
        .await?;

        let deleted = outcomes.iter().filter(|ok| **ok).count();
        let failed = orphan_count - deleted;

        tracing::info!(
            run_id = %run.id,
            scanned,
            orphans = orphan_count,
            deleted,
            failed,
            "Orphan sweep finished"
        );

        Ok(serde_json::json!({
            "task": "orphan_sweep",
            "scanned": scanned,
            "orphans": orphan_count,
            "deleted": deleted,
            "failed": failed,
        }))
    }
}
