// SQLite SnapshotRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::domain::RunSnapshot;
use catalyx_core::error::Result;
use catalyx_core::port::SnapshotRepository;
use sqlx::SqlitePool;

pub struct SqliteSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for SqliteSnapshotRepository {
    async fn insert(&self, snapshot: &RunSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO run_snapshots (id, job_id, project_id, output_url, artifact_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.job_id)
        .bind(&snapshot.project_id)
        .bind(&snapshot.output_url)
        .bind(&snapshot.artifact_url)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_by_job(&self, job_id: &str) -> Result<Vec<RunSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM run_snapshots WHERE job_id = ? ORDER BY created_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|r| RunSnapshot {
                id: r.id,
                job_id: r.job_id,
                project_id: r.project_id,
                output_url: r.output_url,
                artifact_url: r.artifact_url,
                created_at: r.created_at,
            })
            .collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: String,
    job_id: String,
    project_id: String,
    output_url: Option<String>,
    artifact_url: Option<String>,
    created_at: i64,
}
