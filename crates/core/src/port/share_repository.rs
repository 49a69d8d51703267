// Share Repository Port (Interface)

use crate::domain::Share;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Insert a share; a taken `share_id` is `AppError::Conflict`
    async fn insert(&self, share: &Share) -> Result<()>;

    async fn find(&self, share_id: &str) -> Result<Option<Share>>;

    /// Atomically bump the view counter, returning the updated share
    async fn increment_views(&self, share_id: &str) -> Result<Option<Share>>;

    async fn delete(&self, share_id: &str) -> Result<bool>;

    /// Shares created by a user, newest first
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Share>>;

    /// Remove shares whose `expires_at` has passed
    async fn delete_expired(&self, now_millis: i64) -> Result<u64>;
}
