//! Route Handlers
//!
//! Thin adapters: authenticate, call the application service, wrap the
//! result in the response envelope.

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{
    AddNodeRequest, ApiResponse, CreateProjectRequest, CreateRunJobRequest, CreateShareRequest,
    CreateSnapshotRequest, DeleteRunHistoryRequest, EditProjectRequest, JobRequest, LoginRequest,
    LoginUser, NodeRequest, ProjectRequest, RenameNodeRequest, RunFileRequest, RunHistoryRequest,
    SaveProjectRequest, SignUpRequest, TokenRequest, UpdateFileRequest, UpdateRunJobRequest,
};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use catalyx_core::application::SaveProject;
use catalyx_core::AppError;
use serde_json::{json, Value};

pub type ApiResult = Result<Json<ApiResponse<Value>>, ApiError>;

pub const HEALTH_MSG: &str = "CodeX IDE API is running";

fn ok(msg: &str, data: Value) -> ApiResult {
    Ok(Json(ApiResponse::ok(msg, data)))
}

/// `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Body token first, then the Authorization header
fn token_from(body: Option<String>, headers: &HeaderMap) -> Option<String> {
    body.filter(|t| !t.trim().is_empty())
        .or_else(|| bearer_token(headers))
}

async fn user_id(
    state: &AppState,
    token: Option<String>,
    headers: &HeaderMap,
) -> Result<String, ApiError> {
    let token = token_from(token, headers);
    let user = state.auth.authenticate(token.as_deref()).await?;
    Ok(user.id)
}

fn require(value: &str, msg: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(msg).into());
    }
    Ok(())
}

pub async fn health() -> ApiResult {
    ok(HEALTH_MSG, json!({}))
}

pub async fn fallback() -> ApiError {
    ApiError::RouteNotFound
}

// ── Accounts ─────────────────────────────────────────────────────────

pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = state
        .auth
        .sign_up(&req.email, &req.pwd, &req.full_name)
        .await?;
    ok("User created successfully", json!({ "userId": user_id }))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let outcome = state.auth.login(&req.email, &req.pwd).await?;
    let user = LoginUser {
        id: outcome.user.id,
        name: outcome.user.name,
        email: outcome.user.email,
    };
    ok(
        "User logged in successfully",
        json!({ "token": outcome.token, "user": user }),
    )
}

pub async fn get_user_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let token = token_from(req.token, &headers);
    let profile = state.auth.get_user_data(token.as_deref()).await?;
    ok("User data fetched successfully", json!({ "user": profile }))
}

// ── Projects ─────────────────────────────────────────────────────────

pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    let project = state
        .projects
        .create(
            &user_id,
            &req.name,
            req.description.as_deref(),
            req.language.as_deref(),
        )
        .await?;
    ok(
        "Project created successfully",
        json!({ "projectId": project.id, "project": project }),
    )
}

pub async fn save_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SaveProjectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;

    let changes = SaveProject {
        code: req.code,
        files: req.files,
        file_tree: req.file_tree,
    };
    let project = state
        .projects
        .save(&user_id, &req.project_id, changes)
        .await?;
    ok("Project saved successfully", json!({ "project": project }))
}

pub async fn get_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    let projects = state.projects.list(&user_id).await?;
    let total = projects.len();
    ok(
        "Projects fetched successfully",
        json!({ "projects": projects, "total": total }),
    )
}

pub async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    let project = state.projects.get(&user_id, &req.project_id).await?;
    ok("Project fetched successfully", json!({ "project": project }))
}

pub async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    state.projects.delete(&user_id, &req.project_id).await?;
    ok("Project deleted successfully", json!({}))
}

pub async fn edit_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<EditProjectRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    let project = state
        .projects
        .rename(&user_id, &req.project_id, &req.name)
        .await?;
    ok("Project edited successfully", json!({ "project": project }))
}

// ── File tree ────────────────────────────────────────────────────────

pub async fn add_node(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AddNodeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    let (project, node) = state
        .projects
        .add_node(
            &user_id,
            &req.project_id,
            req.parent_id.as_deref(),
            &req.name,
            req.kind,
        )
        .await?;
    ok(
        "Node added successfully",
        json!({ "node": node, "project": project }),
    )
}

pub async fn delete_node(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    require(&req.node_id, "Node ID is required")?;
    let project = state
        .projects
        .delete_node(&user_id, &req.project_id, &req.node_id)
        .await?;
    ok("Node deleted successfully", json!({ "project": project }))
}

pub async fn rename_node(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RenameNodeRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    require(&req.node_id, "Node ID is required")?;
    let project = state
        .projects
        .rename_node(&user_id, &req.project_id, &req.node_id, &req.name)
        .await?;
    ok("Node renamed successfully", json!({ "project": project }))
}

pub async fn update_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UpdateFileRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    require(&req.file_id, "File ID is required")?;
    let project = state
        .projects
        .update_file(&user_id, &req.project_id, &req.file_id, &req.content)
        .await?;
    ok("File updated successfully", json!({ "project": project }))
}

// ── Runs ─────────────────────────────────────────────────────────────

pub async fn create_run_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateRunJobRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Token and projectId are required")?;
    let job = state
        .runs
        .create_job(&user_id, &req.project_id, req.entry_point.as_deref())
        .await?;
    ok(
        "Run job created successfully",
        json!({ "jobId": job.id, "job": job }),
    )
}

pub async fn update_run_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UpdateRunJobRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.job_id, "Token and jobId are required")?;
    let job = state
        .runs
        .update_job(&user_id, &req.job_id, req.status, req.output, req.error)
        .await?;
    ok("Run job updated successfully", json!({ "job": job }))
}

pub async fn get_run_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RunHistoryRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Token and projectId are required")?;
    let jobs = state
        .runs
        .history(&user_id, &req.project_id, req.limit)
        .await?;
    ok("Run history fetched successfully", json!({ "jobs": jobs }))
}

pub async fn delete_run_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DeleteRunHistoryRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Token, projectId, and entryPoint are required")?;
    let deleted = state
        .runs
        .delete_history(&user_id, &req.project_id, &req.entry_point)
        .await?;
    ok(
        "Run history deleted successfully",
        json!({ "deletedCount": deleted }),
    )
}

pub async fn create_run_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateSnapshotRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.job_id, "Token, jobId, and projectId are required")?;
    require(&req.project_id, "Token, jobId, and projectId are required")?;
    let snapshot = state
        .runs
        .create_snapshot(
            &user_id,
            &req.job_id,
            &req.project_id,
            req.output_url,
            req.artifact_url,
        )
        .await?;
    ok(
        "Run snapshot created successfully",
        json!({ "snapshotId": snapshot.id, "snapshot": snapshot }),
    )
}

pub async fn get_run_snapshots(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.job_id, "Token and jobId are required")?;
    let snapshots = state.runs.snapshots(&user_id, &req.job_id).await?;
    ok(
        "Run snapshots fetched successfully",
        json!({ "snapshots": snapshots }),
    )
}

pub async fn run_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RunFileRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    require(&req.project_id, "Project ID is required")?;
    require(&req.file_id, "File ID is required")?;
    let result = state
        .runs
        .run_file(&user_id, &req.project_id, &req.file_id, req.code)
        .await?;
    let msg = if result.preview.is_some() {
        "File preview generated"
    } else {
        "File executed"
    };
    ok(
        msg,
        json!({
            "job": result.job,
            "output": result.output,
            "hasError": result.has_error,
            "preview": result.preview,
        }),
    )
}

// ── Shares ───────────────────────────────────────────────────────────

pub async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    // A bad token downgrades to an anonymous share
    let token = token_from(req.token, &headers);
    let shared_by = state.auth.try_user_id(token.as_deref()).await;
    let share = state
        .shares
        .create(&req.code, &req.language, &req.file_name, shared_by)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Share created successfully",
            json!({ "shareId": share.share_id }),
        )),
    ))
}

pub async fn get_share(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> ApiResult {
    let view = state.shares.get(&share_id).await?;
    Ok(Json(ApiResponse::data(json!({ "share": view }))))
}

/// `DELETE /share/{shareId}`; the token may come in an optional JSON body
pub async fn delete_share(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    let req: TokenRequest = if body.is_empty() {
        TokenRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadJson(e.to_string()))?
    };
    let user_id = user_id(&state, req.token, &headers).await?;
    state.shares.delete(&user_id, &share_id).await?;
    ok("Share deleted successfully", json!({}))
}

pub async fn get_my_shares(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let user_id = user_id(&state, req.token, &headers).await?;
    let shares = state.shares.my_shares(&user_id).await?;
    Ok(Json(ApiResponse::data(json!({ "shares": shares }))))
}
