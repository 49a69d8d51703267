// Run Job Repository Port (Interface)

use crate::domain::{RunJob, RunStatus};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RunJobRepository: Send + Sync {
    async fn insert(&self, job: &RunJob) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<RunJob>>;

    async fn update(&self, job: &RunJob) -> Result<()>;

    /// Project run history, newest `queued_at` first
    async fn history(&self, project_id: &str, limit: i64) -> Result<Vec<RunJob>>;

    /// Delete all runs of one entry point (and their snapshots)
    async fn delete_by_entry_point(&self, project_id: &str, entry_point: &str) -> Result<u64>;

    /// All jobs in a state (for recovery)
    async fn find_by_status(&self, status: RunStatus) -> Result<Vec<RunJob>>;
}
