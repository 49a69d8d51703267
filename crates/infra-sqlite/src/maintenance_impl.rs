// SQLite Maintenance Implementation
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::error::{AppError, Result};
use catalyx_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Get DB file size in bytes
    async fn get_db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page size: {}", e)))?;

        Ok(page_count * page_size)
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

fn to_mb(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");

        let size_before = to_mb(self.get_db_size_bytes().await?);

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = to_mb(self.get_db_size_bytes().await?);
        let reclaimed = (size_before - size_after).max(0.0);

        info!(
            size_before_mb = size_before,
            size_after_mb = size_after,
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn gc_finished_runs(&self, retention_days: i64) -> Result<i64> {
        let cutoff_time = self.time_provider.now_millis() - retention_days * DAY_MS;

        info!(
            retention_days = retention_days,
            cutoff_time = cutoff_time,
            "Running finished run GC"
        );

        let result = sqlx::query(
            r#"
            DELETE FROM run_jobs
            WHERE status IN ('success', 'failed')
            AND finished_at IS NOT NULL
            AND finished_at < ?
            "#,
        )
        .bind(cutoff_time)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Run GC failed: {}", e)))?;

        let deleted = result.rows_affected() as i64;
        info!(deleted_runs = deleted, "Finished run GC completed");
        Ok(deleted)
    }

    async fn gc_expired_shares(&self, now_millis: i64) -> Result<i64> {
        let result = sqlx::query("DELETE FROM shares WHERE expires_at < ?")
            .bind(now_millis)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Share GC failed: {}", e)))?;

        let deleted = result.rows_affected() as i64;
        info!(deleted_shares = deleted, "Expired share GC completed");
        Ok(deleted)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_bytes = self.get_db_size_bytes().await?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let fragmentation_percent = if page_count > 0 {
            (freelist_count as f64 / page_count as f64) * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_mb: to_mb(db_size_bytes),
            db_size_bytes,
            user_count: self.count("SELECT COUNT(*) FROM users").await?,
            project_count: self.count("SELECT COUNT(*) FROM projects").await?,
            run_count: self.count("SELECT COUNT(*) FROM run_jobs").await?,
            finished_run_count: self
                .count("SELECT COUNT(*) FROM run_jobs WHERE status IN ('success', 'failed')")
                .await?,
            share_count: self.count("SELECT COUNT(*) FROM shares").await?,
            fragmentation_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, setup_test_db};
    use crate::{SqliteProjectRepository, SqliteRunJobRepository, SqliteShareRepository};
    use catalyx_core::domain::{Project, ProjectLanguage, RunJob, RunStatus, Share};
    use catalyx_core::port::time_provider::mocks::FixedClock;
    use catalyx_core::port::{
        MaintenanceConfig, ProjectRepository, RunJobRepository, ShareRepository,
    };

    const NOW: i64 = 100 * DAY_MS;

    #[tokio::test]
    async fn test_maintenance_stats() {
        let pool = setup_test_db().await;
        let maintenance = SqliteMaintenance::new(pool, Arc::new(FixedClock::new(NOW)));

        let stats = maintenance.get_stats().await.unwrap();
        assert!(stats.db_size_mb > 0.0);
        assert_eq!(stats.run_count, 0);
        assert_eq!(stats.share_count, 0);
    }

    #[tokio::test]
    async fn test_vacuum() {
        let pool = setup_test_db().await;
        let maintenance = SqliteMaintenance::new(pool, Arc::new(FixedClock::new(NOW)));

        let reclaimed = maintenance.vacuum().await.unwrap();
        assert!(reclaimed >= 0.0);
    }

    #[tokio::test]
    async fn test_full_maintenance_collects_old_rows() {
        let pool = setup_test_db().await;
        seed_user(&pool, "u1").await;
        SqliteProjectRepository::new(pool.clone())
            .insert(&Project::new("p1", 0, "u1", "Demo", "", ProjectLanguage::Python))
            .await
            .unwrap();

        let jobs = SqliteRunJobRepository::new(pool.clone());
        let mut old = RunJob::new("old", 0, "p1", "u1", None);
        old.finish(RunStatus::Success, NOW - 40 * DAY_MS).unwrap();
        let mut recent = RunJob::new("recent", 0, "p1", "u1", None);
        recent.finish(RunStatus::Failed, NOW - DAY_MS).unwrap();
        let mut running = RunJob::new("running", 0, "p1", "u1", None);
        running.start(0).unwrap();
        for job in [&old, &recent, &running] {
            jobs.insert(job).await.unwrap();
        }

        let shares = SqliteShareRepository::new(pool.clone());
        shares
            .insert(&Share::new("Expired1", 0, "x", "python", "a.py", None))
            .await
            .unwrap();
        shares
            .insert(&Share::new("Fresh001", NOW, "x", "python", "a.py", None))
            .await
            .unwrap();

        let maintenance = SqliteMaintenance::new(pool, Arc::new(FixedClock::new(NOW)));
        let stats = maintenance
            .run_full_maintenance(&MaintenanceConfig::default(), NOW)
            .await
            .unwrap();

        assert_eq!(stats.run_count, 2);
        assert_eq!(stats.finished_run_count, 1);
        assert_eq!(stats.share_count, 1);
        assert!(jobs.find_by_id("old").await.unwrap().is_none());
        assert!(shares.find("Fresh001").await.unwrap().is_some());
    }
}
