// SQLite RunJobRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::domain::{RunJob, RunStatus};
use catalyx_core::error::{AppError, Result};
use catalyx_core::port::RunJobRepository;
use sqlx::SqlitePool;

pub struct SqliteRunJobRepository {
    pool: SqlitePool,
}

impl SqliteRunJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunJobRepository for SqliteRunJobRepository {
    async fn insert(&self, job: &RunJob) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO run_jobs (
                id, project_id, user_id, entry_point, status,
                queued_at, started_at, finished_at, output, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.project_id)
        .bind(&job.user_id)
        .bind(&job.entry_point)
        .bind(job.status.as_str())
        .bind(job.queued_at)
        .bind(job.started_at)
        .bind(job.finished_at)
        .bind(&job.output)
        .bind(&job.error)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<RunJob>> {
        let row = sqlx::query_as::<_, RunJobRow>("SELECT * FROM run_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(RunJobRow::into_job).transpose()
    }

    async fn update(&self, job: &RunJob) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE run_jobs
            SET status = ?, started_at = ?, finished_at = ?, output = ?, error = ?
            WHERE id = ?
            "#,
        )
        .bind(job.status.as_str())
        .bind(job.started_at)
        .bind(job.finished_at)
        .bind(&job.output)
        .bind(&job.error)
        .bind(&job.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Run job not found"));
        }
        Ok(())
    }

    async fn history(&self, project_id: &str, limit: i64) -> Result<Vec<RunJob>> {
        let rows = sqlx::query_as::<_, RunJobRow>(
            r#"
            SELECT * FROM run_jobs
            WHERE project_id = ?
            ORDER BY queued_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RunJobRow::into_job).collect()
    }

    async fn delete_by_entry_point(&self, project_id: &str, entry_point: &str) -> Result<u64> {
        // run_snapshots cascade
        let result = sqlx::query("DELETE FROM run_jobs WHERE project_id = ? AND entry_point = ?")
            .bind(project_id)
            .bind(entry_point)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn find_by_status(&self, status: RunStatus) -> Result<Vec<RunJob>> {
        let rows = sqlx::query_as::<_, RunJobRow>(
            "SELECT * FROM run_jobs WHERE status = ? ORDER BY queued_at ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RunJobRow::into_job).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RunJobRow {
    id: String,
    project_id: String,
    user_id: String,
    entry_point: String,
    status: String,
    queued_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    output: String,
    error: String,
}

impl RunJobRow {
    fn into_job(self) -> Result<RunJob> {
        Ok(RunJob {
            status: self.status.parse::<RunStatus>()?,
            id: self.id,
            project_id: self.project_id,
            user_id: self.user_id,
            entry_point: self.entry_point,
            queued_at: self.queued_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            output: self.output,
            error: self.error,
        })
    }
}
