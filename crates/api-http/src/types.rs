//! Request/Response Types
//!
//! Field names follow the JSON the editor frontend sends. Every request
//! field is optional so that missing values surface as the service's own
//! validation messages rather than deserialization errors.

use catalyx_core::domain::{FileTree, FlatFile, NodeKind, RunStatus};
use serde::{Deserialize, Serialize};

/// Success envelope: `{ "success": true, "msg": ..., ...data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            msg: Some(msg.into()),
            data,
        }
    }

    /// Envelope without a message (public share reads)
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            msg: None,
            data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub pwd: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub pwd: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    pub code: Option<String>,
    pub files: Option<Vec<FlatFile>>,
    pub file_tree: Option<FileTree>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProjectRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNodeRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub node_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameNodeRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunJobRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    pub entry_point: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunJobRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub job_id: String,
    pub status: Option<RunStatus>,
    pub output: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub job_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHistoryRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRunHistoryRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub entry_point: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub project_id: String,
    pub output_url: Option<String>,
    pub artifact_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFileRequest {
    pub token: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub file_id: String,
    /// Unsaved editor buffer; the stored content is used when absent
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub file_name: String,
    pub token: Option<String>,
}

/// Login response `user` object
#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_data() {
        let resp = ApiResponse::ok("Projects fetched successfully", json!({ "total": 0 }));
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "msg": "Projects fetched successfully", "total": 0 })
        );

        let value = serde_json::to_value(ApiResponse::data(json!({ "shares": [] }))).unwrap();
        assert_eq!(value, json!({ "success": true, "shares": [] }));
    }

    #[test]
    fn test_camel_case_requests() {
        let req: SignUpRequest =
            serde_json::from_value(json!({ "email": "a@b.c", "pwd": "x", "fullName": "Ada" }))
                .unwrap();
        assert_eq!(req.full_name, "Ada");

        let req: AddNodeRequest = serde_json::from_value(json!({
            "token": "t", "projectId": "p1", "parentId": "f1", "name": "src", "type": "folder"
        }))
        .unwrap();
        assert_eq!(req.kind, NodeKind::Folder);
        assert_eq!(req.parent_id.as_deref(), Some("f1"));

        let req: UpdateRunJobRequest =
            serde_json::from_value(json!({ "jobId": "j1", "status": "failed" })).unwrap();
        assert_eq!(req.status, Some(RunStatus::Failed));
        assert!(req.token.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let req: ProjectRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.project_id.is_empty());
        assert!(req.token.is_none());
    }
}
