// Run Job Use Cases
//
// Client-reported run bookkeeping plus server-side execution of a single
// file through the `CodeRunner` port.

pub mod output;

use crate::application::project::{NOT_OWNER_MSG, PROJECT_NOT_FOUND_MSG};
use crate::domain::{PreviewKind, Project, RunJob, RunSnapshot, RunStatus, RunTarget};
use crate::error::{AppError, Result};
use crate::port::{
    CodeRunner, ExecutionRequest, IdProvider, ProjectRepository, RunJobRepository,
    SnapshotRepository, TimeProvider,
};
use std::sync::Arc;
use tracing::{info, warn};

pub use output::{classify, classify_error, render_preview, Classified};

/// History size when the client does not ask for one
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

pub fn clamp_history_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// Result of `run_file`. Previews carry no job.
#[derive(Debug, Clone)]
pub struct RunFileResult {
    pub job: Option<RunJob>,
    pub output: String,
    pub has_error: bool,
    pub preview: Option<PreviewKind>,
}

pub struct RunService {
    projects: Arc<dyn ProjectRepository>,
    jobs: Arc<dyn RunJobRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
    runner: Arc<dyn CodeRunner>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RunService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        jobs: Arc<dyn RunJobRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        runner: Arc<dyn CodeRunner>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            projects,
            jobs,
            snapshots,
            runner,
            id_provider,
            time_provider,
        }
    }

    async fn owned_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found(PROJECT_NOT_FOUND_MSG))?;
        if !project.is_owned_by(user_id) {
            return Err(AppError::forbidden(NOT_OWNER_MSG));
        }
        Ok(project)
    }

    async fn find_job(&self, job_id: &str) -> Result<RunJob> {
        self.jobs
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Run job not found"))
    }

    /// Record a queued run of `entry_point`
    pub async fn create_job(
        &self,
        user_id: &str,
        project_id: &str,
        entry_point: Option<&str>,
    ) -> Result<RunJob> {
        self.owned_project(user_id, project_id).await?;

        let job = RunJob::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            project_id,
            user_id,
            entry_point,
        );
        self.jobs.insert(&job).await?;

        info!(job_id = %job.id, project_id = %project_id, entry_point = %job.entry_point, "Run job created");
        Ok(job)
    }

    pub async fn update_job(
        &self,
        user_id: &str,
        job_id: &str,
        status: Option<RunStatus>,
        output: Option<String>,
        error: Option<String>,
    ) -> Result<RunJob> {
        let mut job = self.find_job(job_id).await?;
        if job.user_id != user_id {
            return Err(AppError::forbidden("Unauthorized"));
        }

        job.apply_update(status, output, error, self.time_provider.now_millis())?;
        self.jobs.update(&job).await?;

        info!(job_id = %job.id, status = %job.status, "Run job updated");
        Ok(job)
    }

    pub async fn history(
        &self,
        user_id: &str,
        project_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<RunJob>> {
        self.owned_project(user_id, project_id).await?;
        self.jobs
            .history(project_id, clamp_history_limit(limit))
            .await
    }

    /// Delete every run of one entry point, returning how many were removed
    pub async fn delete_history(
        &self,
        user_id: &str,
        project_id: &str,
        entry_point: &str,
    ) -> Result<u64> {
        if entry_point.trim().is_empty() {
            return Err(AppError::validation(
                "Token, projectId, and entryPoint are required",
            ));
        }
        self.owned_project(user_id, project_id).await?;

        let deleted = self
            .jobs
            .delete_by_entry_point(project_id, entry_point.trim())
            .await?;
        info!(project_id = %project_id, entry_point = %entry_point, deleted, "Run history deleted");
        Ok(deleted)
    }

    pub async fn create_snapshot(
        &self,
        user_id: &str,
        job_id: &str,
        project_id: &str,
        output_url: Option<String>,
        artifact_url: Option<String>,
    ) -> Result<RunSnapshot> {
        self.owned_project(user_id, project_id).await?;
        let job = self.find_job(job_id).await?;
        if job.project_id != project_id {
            return Err(AppError::validation(
                "Run job does not belong to this project",
            ));
        }

        let snapshot = RunSnapshot::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            job_id,
            project_id,
            output_url,
            artifact_url,
        );
        self.snapshots.insert(&snapshot).await?;
        Ok(snapshot)
    }

    pub async fn snapshots(&self, user_id: &str, job_id: &str) -> Result<Vec<RunSnapshot>> {
        let job = self.find_job(job_id).await?;
        self.owned_project(user_id, &job.project_id).await?;
        self.snapshots.list_by_job(job_id).await
    }

    /// Execute (or preview) one file of the project's tree.
    /// `code` overrides the stored content with the editor's unsaved buffer.
    pub async fn run_file(
        &self,
        user_id: &str,
        project_id: &str,
        file_id: &str,
        code: Option<String>,
    ) -> Result<RunFileResult> {
        let project = self.owned_project(user_id, project_id).await?;
        let tree = project.effective_tree();
        let file = tree
            .find(file_id)
            .filter(|n| n.is_file())
            .ok_or_else(|| AppError::not_found("File not found"))?;
        let content = code.unwrap_or_else(|| file.content.clone());

        let target = RunTarget::detect(&file.name).ok_or_else(|| {
            AppError::validation(format!("Unsupported file type: {}", file.name))
        })?;

        let (language, file_name) = match target {
            RunTarget::Preview(kind) => {
                return Ok(RunFileResult {
                    job: None,
                    output: render_preview(kind, &file.name, &content),
                    has_error: false,
                    preview: Some(kind),
                });
            }
            RunTarget::Execute {
                language,
                file_name,
            } => (language, file_name),
        };

        let mut job = RunJob::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            project_id,
            user_id,
            Some(file.name.as_str()),
        );
        job.start(self.time_provider.now_millis())?;
        self.jobs.insert(&job).await?;

        let request = ExecutionRequest {
            language,
            file_name,
            content,
        };
        let classified = match self.runner.execute(&request).await {
            Ok(outcome) => classify(&outcome),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Execution failed");
                classify_error(&e)
            }
        };

        job.output = classified.output.clone();
        job.error = classified.error.clone();
        job.finish(classified.status, self.time_provider.now_millis())?;
        self.jobs.update(&job).await?;

        info!(
            job_id = %job.id,
            project_id = %project_id,
            language = %request.language,
            status = %job.status,
            "File executed"
        );
        Ok(RunFileResult {
            has_error: classified.has_error(),
            output: classified.output,
            job: Some(job),
            preview: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limit_clamped() {
        assert_eq!(clamp_history_limit(None), 20);
        assert_eq!(clamp_history_limit(Some(0)), 1);
        assert_eq!(clamp_history_limit(Some(-5)), 1);
        assert_eq!(clamp_history_limit(Some(50)), 50);
        assert_eq!(clamp_history_limit(Some(1000)), 100);
    }
}
