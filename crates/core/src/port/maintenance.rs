// DB Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Database maintenance statistics
#[derive(Debug, Clone, Default)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub user_count: i64,
    pub project_count: i64,
    pub run_count: i64,
    pub finished_run_count: i64,
    pub share_count: i64,
    pub fragmentation_percent: f64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for finished run jobs (days)
    pub run_retention_days: i64,

    /// DB size above which VACUUM runs (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            run_retention_days: 30,
            max_db_size_mb: 1000.0, // 1GB
        }
    }
}

/// Database maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete finished run jobs older than the retention period
    ///
    /// # Returns
    /// Number of runs deleted
    async fn gc_finished_runs(&self, retention_days: i64) -> Result<i64>;

    /// Delete shares that expired before `now_millis`
    async fn gc_expired_shares(&self, now_millis: i64) -> Result<i64>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (GC + VACUUM when the DB is large)
    async fn run_full_maintenance(
        &self,
        config: &MaintenanceConfig,
        now_millis: i64,
    ) -> Result<MaintenanceStats> {
        let stats_before = self.get_stats().await?;

        let deleted_shares = self.gc_expired_shares(now_millis).await?;
        let deleted_runs = self.gc_finished_runs(config.run_retention_days).await?;

        let reclaimed_mb = if stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let stats_after = self.get_stats().await?;

        tracing::info!(
            deleted_shares = deleted_shares,
            deleted_runs = deleted_runs,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats_after.db_size_mb,
            "Maintenance completed"
        );

        Ok(stats_after)
    }
}
