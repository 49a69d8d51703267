// Project Repository Port (Interface)

use crate::domain::Project;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn insert(&self, project: &Project) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>>;

    /// Overwrite all mutable fields
    async fn update(&self, project: &Project) -> Result<()>;

    /// Delete a project with its run jobs and snapshots.
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Owner's projects, most recently updated first
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>>;
}
