//! CatalyX HTTP Client

use crate::error::{Result, SdkError};
use crate::types::{
    AddNodeResponse, CreateJobResponse, CreateProjectResponse, DeletedCount, Empty, Envelope,
    ErrorBody, JobList, JobResponse, LoginResponse, ProjectList, ProjectResponse,
    RunFileResponse, ShareCreated, ShareList, ShareResponse, SignUpResponse, SnapshotList,
    SnapshotResponse, UserResponse,
};
use catalyx_core::domain::{FileTree, FlatFile, NodeKind, RunStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fields of a project save; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_tree: Option<FileTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FlatFile>>,
}

/// Client-reported run update
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Typed client for the CatalyX REST API
///
/// ```no_run
/// use catalyx_sdk::CatalyxClient;
///
/// # async fn example() -> catalyx_sdk::Result<()> {
/// let client = CatalyxClient::new("http://127.0.0.1:8080")?;
/// let login = client.login("ada@example.com", "secret").await?;
/// let client = client.with_token(login.token);
/// let projects = client.get_projects().await?;
/// println!("{} projects", projects.total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalyxClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CatalyxClient {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.as_ref().trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SdkError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token: None,
        })
    }

    /// Same client, authenticated with `token`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(SdkError::NotAuthenticated)
    }

    /// Body with the session token merged in
    fn authed(&self, body: Value) -> Result<Value> {
        let token = self.require_token()?;
        let mut map = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("token".to_string(), Value::String(token.to_string()));
        Ok(Value::Object(map))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let message = body
                .msg
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
            return Err(SdkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(SdkError::Api {
                status: status.as_u16(),
                message: envelope.msg.unwrap_or_default(),
            });
        }
        Ok(envelope.data)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn post_authed<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let body = self.authed(body)?;
        self.post(path, body).await
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Health check message
    pub async fn health(&self) -> Result<String> {
        let response = self.http.get(self.url("/")).send().await?;
        let status = response.status();
        let envelope: Envelope<Empty> = serde_json::from_slice(&response.bytes().await?)?;
        if !status.is_success() {
            return Err(SdkError::Api {
                status: status.as_u16(),
                message: envelope.msg.unwrap_or_default(),
            });
        }
        Ok(envelope.msg.unwrap_or_default())
    }

    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<String> {
        let resp: SignUpResponse = self
            .post(
                "/signUp",
                json!({ "email": email, "pwd": password, "fullName": full_name }),
            )
            .await?;
        Ok(resp.user_id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        self.post("/login", json!({ "email": email, "pwd": password }))
            .await
    }

    pub async fn get_user_data(&self) -> Result<UserResponse> {
        self.post_authed("/getUserData", json!({})).await
    }

    // ── Projects ─────────────────────────────────────────────────────

    pub async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        language: Option<&str>,
    ) -> Result<CreateProjectResponse> {
        self.post_authed(
            "/createProj",
            json!({ "name": name, "description": description, "language": language }),
        )
        .await
    }

    pub async fn save_project(&self, project_id: &str, save: &SaveRequest) -> Result<ProjectResponse> {
        let mut body = serde_json::to_value(save)?;
        if let Value::Object(map) = &mut body {
            map.insert("projectId".to_string(), json!(project_id));
        }
        self.post_authed("/saveProject", body).await
    }

    pub async fn get_projects(&self) -> Result<ProjectList> {
        self.post_authed("/getProjects", json!({})).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<ProjectResponse> {
        self.post_authed("/getProject", json!({ "projectId": project_id }))
            .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let _: Empty = self
            .post_authed("/deleteProject", json!({ "projectId": project_id }))
            .await?;
        Ok(())
    }

    pub async fn edit_project(&self, project_id: &str, name: &str) -> Result<ProjectResponse> {
        self.post_authed(
            "/editProject",
            json!({ "projectId": project_id, "name": name }),
        )
        .await
    }

    // ── File tree ────────────────────────────────────────────────────

    pub async fn add_node(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
        name: &str,
        kind: NodeKind,
    ) -> Result<AddNodeResponse> {
        self.post_authed(
            "/addNode",
            json!({ "projectId": project_id, "parentId": parent_id, "name": name, "type": kind }),
        )
        .await
    }

    pub async fn delete_node(&self, project_id: &str, node_id: &str) -> Result<ProjectResponse> {
        self.post_authed(
            "/deleteNode",
            json!({ "projectId": project_id, "nodeId": node_id }),
        )
        .await
    }

    pub async fn rename_node(
        &self,
        project_id: &str,
        node_id: &str,
        name: &str,
    ) -> Result<ProjectResponse> {
        self.post_authed(
            "/renameNode",
            json!({ "projectId": project_id, "nodeId": node_id, "name": name }),
        )
        .await
    }

    pub async fn update_file(
        &self,
        project_id: &str,
        file_id: &str,
        content: &str,
    ) -> Result<ProjectResponse> {
        self.post_authed(
            "/updateFile",
            json!({ "projectId": project_id, "fileId": file_id, "content": content }),
        )
        .await
    }

    // ── Runs ─────────────────────────────────────────────────────────

    pub async fn create_run_job(
        &self,
        project_id: &str,
        entry_point: Option<&str>,
    ) -> Result<CreateJobResponse> {
        self.post_authed(
            "/createRunJob",
            json!({ "projectId": project_id, "entryPoint": entry_point }),
        )
        .await
    }

    pub async fn update_run_job(&self, job_id: &str, update: &RunUpdate) -> Result<JobResponse> {
        let mut body = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut body {
            map.insert("jobId".to_string(), json!(job_id));
        }
        self.post_authed("/updateRunJob", body).await
    }

    pub async fn get_run_history(&self, project_id: &str, limit: Option<i64>) -> Result<JobList> {
        self.post_authed(
            "/getRunHistory",
            json!({ "projectId": project_id, "limit": limit }),
        )
        .await
    }

    /// Returns the number of deleted runs
    pub async fn delete_run_history(&self, project_id: &str, entry_point: &str) -> Result<u64> {
        let resp: DeletedCount = self
            .post_authed(
                "/deleteRunHistory",
                json!({ "projectId": project_id, "entryPoint": entry_point }),
            )
            .await?;
        Ok(resp.deleted_count)
    }

    pub async fn create_run_snapshot(
        &self,
        job_id: &str,
        project_id: &str,
        output_url: Option<&str>,
        artifact_url: Option<&str>,
    ) -> Result<SnapshotResponse> {
        self.post_authed(
            "/createRunSnapshot",
            json!({
                "jobId": job_id,
                "projectId": project_id,
                "outputUrl": output_url,
                "artifactUrl": artifact_url,
            }),
        )
        .await
    }

    pub async fn get_run_snapshots(&self, job_id: &str) -> Result<SnapshotList> {
        self.post_authed("/getRunSnapshots", json!({ "jobId": job_id }))
            .await
    }

    /// Execute (or preview) a file; `code` overrides the stored content
    pub async fn run_file(
        &self,
        project_id: &str,
        file_id: &str,
        code: Option<&str>,
    ) -> Result<RunFileResponse> {
        self.post_authed(
            "/runFile",
            json!({ "projectId": project_id, "fileId": file_id, "code": code }),
        )
        .await
    }

    // ── Shares ───────────────────────────────────────────────────────

    /// Share a snippet; anonymous when the client has no token
    pub async fn create_share(&self, code: &str, language: &str, file_name: &str) -> Result<String> {
        let body = json!({
            "code": code,
            "language": language,
            "fileName": file_name,
            "token": self.token,
        });
        let resp: ShareCreated = self.post("/share", body).await?;
        Ok(resp.share_id)
    }

    pub async fn get_share(&self, share_id: &str) -> Result<ShareResponse> {
        let response = self
            .http
            .get(self.url(&format!("/share/{}", share_id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_share(&self, share_id: &str) -> Result<()> {
        let token = self.require_token()?;
        let response = self
            .http
            .delete(self.url(&format!("/share/{}", share_id)))
            .bearer_auth(token)
            .send()
            .await?;
        let _: Empty = Self::decode(response).await?;
        Ok(())
    }

    pub async fn get_my_shares(&self) -> Result<ShareList> {
        self.post_authed("/getMyShares", json!({})).await
    }
}
