// Run Job Domain Model
//
// queued -> running -> success | failed. Terminal jobs are immutable.

use crate::domain::error::{DomainError, Result};
use crate::domain::project::ProjectId;
use crate::domain::user::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job ID (UUID v4)
pub type JobId = String;

/// Entry point used when the client does not name one
pub const DEFAULT_ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(RunStatus::Queued),
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "Invalid run status: {}",
                other
            ))),
        }
    }
}

/// One execution of a project entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJob {
    #[serde(rename = "_id")]
    pub id: JobId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub entry_point: String,
    pub status: RunStatus,
    pub queued_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub output: String,
    pub error: String,
}

impl RunJob {
    /// Create a queued job. A blank entry point falls back to `main`.
    pub fn new(
        id: impl Into<String>,
        queued_at: i64,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        entry_point: Option<&str>,
    ) -> Self {
        let entry_point = entry_point
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENTRY_POINT);

        Self {
            id: id.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            entry_point: entry_point.to_string(),
            status: RunStatus::Queued,
            queued_at,
            started_at: None,
            finished_at: None,
            output: String::new(),
            error: String::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn invalid(&self, to: RunStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// queued -> running
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.status != RunStatus::Queued {
            return Err(self.invalid(RunStatus::Running));
        }
        self.status = RunStatus::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// queued | running -> success | failed
    pub fn finish(&mut self, status: RunStatus, now_millis: i64) -> Result<()> {
        if !status.is_terminal() || self.is_terminal() {
            return Err(self.invalid(status));
        }
        self.status = status;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Client-reported update. A missing status means success; output and
    /// error are only written when the transition is valid.
    pub fn apply_update(
        &mut self,
        status: Option<RunStatus>,
        output: Option<String>,
        error: Option<String>,
        now_millis: i64,
    ) -> Result<()> {
        match status.unwrap_or(RunStatus::Success) {
            RunStatus::Queued => return Err(self.invalid(RunStatus::Queued)),
            RunStatus::Running => self.start(now_millis)?,
            terminal => self.finish(terminal, now_millis)?,
        }
        if let Some(output) = output {
            self.output = output;
        }
        if let Some(error) = error {
            self.error = error;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RunJob {
        RunJob::new("j1", 1000, "p1", "u1", None)
    }

    #[test]
    fn test_new_job_is_queued_with_default_entry_point() {
        let job = job();
        assert_eq!(job.status, RunStatus::Queued);
        assert_eq!(job.entry_point, "main");
        assert!(job.started_at.is_none());

        let job = RunJob::new("j2", 1000, "p1", "u1", Some("  "));
        assert_eq!(job.entry_point, "main");
        let job = RunJob::new("j3", 1000, "p1", "u1", Some("app.py"));
        assert_eq!(job.entry_point, "app.py");
    }

    #[test]
    fn test_full_lifecycle() {
        let mut job = job();
        job.start(2000).unwrap();
        assert_eq!(job.status, RunStatus::Running);
        assert_eq!(job.started_at, Some(2000));
        assert!(job.finished_at.is_none());

        job.finish(RunStatus::Success, 3000).unwrap();
        assert_eq!(job.finished_at, Some(3000));
        assert!(job.is_terminal());
    }

    #[test]
    fn test_queued_job_can_finish_directly() {
        let mut job = job();
        job.finish(RunStatus::Failed, 1500).unwrap();
        assert_eq!(job.status, RunStatus::Failed);
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_terminal_job_rejects_transitions() {
        let mut job = job();
        job.finish(RunStatus::Success, 1500).unwrap();

        assert!(matches!(
            job.start(1600),
            Err(DomainError::InvalidStateTransition { .. })
        ));
        let err = job.finish(RunStatus::Failed, 1700).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid run job status transition: success -> failed"
        );
        assert_eq!(job.finished_at, Some(1500));
    }

    #[test]
    fn test_finish_requires_terminal_status() {
        let mut job = job();
        assert!(job.finish(RunStatus::Running, 1500).is_err());
        assert_eq!(job.status, RunStatus::Queued);
    }

    #[test]
    fn test_apply_update_defaults_to_success() {
        let mut job = job();
        job.apply_update(None, Some("hi\n".to_string()), None, 2000)
            .unwrap();
        assert_eq!(job.status, RunStatus::Success);
        assert_eq!(job.output, "hi\n");
        assert_eq!(job.finished_at, Some(2000));
    }

    #[test]
    fn test_apply_update_running_then_failed() {
        let mut job = job();
        job.apply_update(Some(RunStatus::Running), None, None, 2000)
            .unwrap();
        assert!(job.finished_at.is_none());

        job.apply_update(Some(RunStatus::Failed), None, Some("boom".to_string()), 3000)
            .unwrap();
        assert_eq!(job.error, "boom");
        assert_eq!(job.started_at, Some(2000));
    }

    #[test]
    fn test_rejected_update_leaves_job_untouched() {
        let mut job = job();
        let before = job.clone();
        assert!(job
            .apply_update(Some(RunStatus::Queued), Some("x".to_string()), None, 2000)
            .is_err());
        assert_eq!(job, before);
    }

    #[test]
    fn test_status_parse_and_json() {
        assert_eq!("running".parse::<RunStatus>(), Ok(RunStatus::Running));
        assert!("done".parse::<RunStatus>().is_err());

        let json = serde_json::to_value(job()).unwrap();
        assert_eq!(json["_id"], "j1");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["entry_point"], "main");
        assert_eq!(json["queued_at"], 1000);
        assert_eq!(json["project_id"], "p1");
        assert_eq!(json["user_id"], "u1");
        assert!(json["started_at"].is_null());
        assert!(json.get("entryPoint").is_none());
    }
}
