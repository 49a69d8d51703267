//! Response payloads
//!
//! Each type is the data part of a `{ "success", "msg", ...data }` envelope.

use catalyx_core::domain::{
    FileNode, PreviewKind, Project, ProjectSummary, RunJob, RunSnapshot, Share, ShareView,
    UserProfile,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// Error body; `msg` is absent on some transport-level rejections
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub project_id: String,
    pub project: Project,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<ProjectSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddNodeResponse {
    pub node: FileNode,
    pub project: Project,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: String,
    pub job: RunJob,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    pub job: RunJob,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    pub jobs: Vec<RunJob>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCount {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub snapshot_id: String,
    pub snapshot: RunSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotList {
    pub snapshots: Vec<RunSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFileResponse {
    pub job: Option<RunJob>,
    pub output: String,
    pub has_error: bool,
    pub preview: Option<PreviewKind>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCreated {
    pub share_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareResponse {
    pub share: ShareView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareList {
    pub shares: Vec<Share>,
}
