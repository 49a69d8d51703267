// Run Snapshot Domain Model

use crate::domain::project::ProjectId;
use crate::domain::run_job::JobId;
use serde::{Deserialize, Serialize};

/// Links to stored output/artifacts of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    #[serde(rename = "_id")]
    pub id: String,
    pub job_id: JobId,
    pub project_id: ProjectId,
    pub output_url: Option<String>,
    pub artifact_url: Option<String>,
    pub created_at: i64, // epoch ms
}

impl RunSnapshot {
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        job_id: impl Into<String>,
        project_id: impl Into<String>,
        output_url: Option<String>,
        artifact_url: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            project_id: project_id.into(),
            output_url,
            artifact_url,
            created_at,
        }
    }
}
