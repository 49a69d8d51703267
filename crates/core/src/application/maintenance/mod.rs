// Maintenance Service
// Scheduled DB maintenance: expired shares, old runs, VACUUM

use crate::error::Result;
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceStats, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Maintenance scheduler
///
/// Runs periodic maintenance operations in the background
pub struct MaintenanceScheduler {
    maintenance: Arc<dyn Maintenance>,
    time_provider: Arc<dyn TimeProvider>,
    config: MaintenanceConfig,
    interval_hours: u64,
}

impl MaintenanceScheduler {
    pub fn new(
        maintenance: Arc<dyn Maintenance>,
        time_provider: Arc<dyn TimeProvider>,
        config: MaintenanceConfig,
        interval_hours: u64,
    ) -> Self {
        Self {
            maintenance,
            time_provider,
            config,
            interval_hours: interval_hours.max(1),
        }
    }

    /// Run maintenance loop (background task)
    ///
    /// The first pass happens immediately. Should be spawned in tokio::spawn.
    pub async fn run(self) {
        info!(
            interval_hours = self.interval_hours,
            run_retention_days = self.config.run_retention_days,
            "Maintenance scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_hours * 3600));

        loop {
            tick.tick().await;

            info!("Running scheduled maintenance...");

            match self.run_now().await {
                Ok(stats) => {
                    info!(
                        db_size_mb = stats.db_size_mb,
                        projects = stats.project_count,
                        runs = stats.run_count,
                        shares = stats.share_count,
                        "Scheduled maintenance completed successfully"
                    );
                }
                Err(e) => {
                    error!(error = ?e, "Scheduled maintenance failed");
                }
            }
        }
    }

    /// Run maintenance immediately (for manual trigger)
    pub async fn run_now(&self) -> Result<MaintenanceStats> {
        self.maintenance
            .run_full_maintenance(&self.config, self.time_provider.now_millis())
            .await
    }
}
