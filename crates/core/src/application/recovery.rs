// Crash recovery for run jobs
use crate::domain::RunStatus;
use crate::port::{RunJobRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs older than this are considered abandoned at startup (5 minutes)
pub const DEFAULT_RECOVERY_WINDOW_MS: i64 = 5 * 60 * 1000;

pub const INTERRUPTED_ERROR: &str = "interrupted by server restart";

/// On startup, fails run jobs that were left `running` by a previous process
pub struct RecoveryService {
    jobs: Arc<dyn RunJobRepository>,
    time_provider: Arc<dyn TimeProvider>,
    recovery_window_ms: i64,
}

impl RecoveryService {
    /// `recovery_window_ms` defaults to 5 minutes
    pub fn new(
        jobs: Arc<dyn RunJobRepository>,
        time_provider: Arc<dyn TimeProvider>,
        recovery_window_ms: Option<i64>,
    ) -> Self {
        Self {
            jobs,
            time_provider,
            recovery_window_ms: recovery_window_ms.unwrap_or(DEFAULT_RECOVERY_WINDOW_MS),
        }
    }

    /// Mark stale `running` jobs as failed
    ///
    /// # Returns
    /// Number of jobs recovered
    pub async fn recover_interrupted_runs(&self) -> crate::error::Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.recovery_window_ms;

        info!(
            cutoff_time = %cutoff,
            recovery_window_ms = %self.recovery_window_ms,
            "Starting interrupted run recovery"
        );

        let running = self.jobs.find_by_status(RunStatus::Running).await?;
        let mut recovered_count = 0;

        for mut job in running {
            match job.started_at {
                Some(started_at) if started_at >= cutoff => continue,
                Some(started_at) => {
                    info!(job_id = %job.id, started_at = %started_at, "Recovering interrupted run");
                }
                None => {
                    warn!(job_id = %job.id, "Running job without started_at, marking as failed");
                }
            }

            job.error = INTERRUPTED_ERROR.to_string();
            job.finish(RunStatus::Failed, now)?;
            self.jobs.update(&job).await?;
            recovered_count += 1;
        }

        info!(recovered_count = %recovered_count, "Interrupted run recovery complete");
        Ok(recovered_count)
    }
}
