// Run Snapshot Repository Port (Interface)

use crate::domain::RunSnapshot;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn insert(&self, snapshot: &RunSnapshot) -> Result<()>;

    async fn list_by_job(&self, job_id: &str) -> Result<Vec<RunSnapshot>>;
}
