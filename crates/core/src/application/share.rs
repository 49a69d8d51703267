// Code Share Use Cases

use crate::domain::{Share, ShareView, UserId};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, ShareRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Attempts at finding a free share id before giving up
pub const MAX_SHARE_ID_ATTEMPTS: usize = 5;

pub struct ShareService {
    shares: Arc<dyn ShareRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ShareService {
    pub fn new(
        shares: Arc<dyn ShareRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            shares,
            id_provider,
            time_provider,
        }
    }

    /// Store a snippet. `shared_by` is `None` for anonymous shares.
    pub async fn create(
        &self,
        code: &str,
        language: &str,
        file_name: &str,
        shared_by: Option<UserId>,
    ) -> Result<Share> {
        if code.is_empty() || language.trim().is_empty() || file_name.trim().is_empty() {
            return Err(AppError::validation(
                "Code, language, and file name are required",
            ));
        }

        for attempt in 1..=MAX_SHARE_ID_ATTEMPTS {
            let share = Share::new(
                self.id_provider.generate_share_id(),
                self.time_provider.now_millis(),
                code,
                language.trim(),
                file_name.trim(),
                shared_by.clone(),
            );
            match self.shares.insert(&share).await {
                Ok(()) => {
                    info!(share_id = %share.share_id, anonymous = share.shared_by.is_none(), "Share created");
                    return Ok(share);
                }
                Err(AppError::Conflict(_)) => {
                    warn!(share_id = %share.share_id, attempt, "Share id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(
            "Could not allocate a unique share id".to_string(),
        ))
    }

    /// Public read; counts the view. Expired shares are removed on access.
    pub async fn get(&self, share_id: &str) -> Result<ShareView> {
        if share_id.trim().is_empty() {
            return Err(AppError::validation("Share ID is required"));
        }
        let share = self
            .shares
            .find(share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;

        if share.is_expired(self.time_provider.now_millis()) {
            self.shares.delete(share_id).await?;
            info!(share_id = %share_id, "Expired share removed");
            return Err(AppError::not_found("Share has expired"));
        }

        let share = self
            .shares
            .increment_views(share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        Ok(share.view())
    }

    pub async fn delete(&self, user_id: &str, share_id: &str) -> Result<()> {
        let share = self
            .shares
            .find(share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        if !share.is_owned_by(user_id) {
            return Err(AppError::forbidden("Not authorized to delete this share"));
        }
        self.shares.delete(share_id).await?;
        info!(share_id = %share_id, "Share deleted");
        Ok(())
    }

    pub async fn my_shares(&self, user_id: &str) -> Result<Vec<Share>> {
        self.shares.list_by_owner(user_id).await
    }
}
