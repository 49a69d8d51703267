//! HTTP Error Mapping
//!
//! Converts application errors into `{ "success": false, "msg": ... }`
//! responses with the matching status code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalyx_core::domain::DomainError;
use catalyx_core::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const RATE_LIMITED_MSG: &str = "Rate limit exceeded. Please slow down.";
pub const ROUTE_NOT_FOUND_MSG: &str = "Route not found";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Body was not valid JSON for the endpoint
    #[error("Invalid request body: {0}")]
    BadJson(String),

    #[error("{RATE_LIMITED_MSG}")]
    RateLimited,

    #[error("{ROUTE_NOT_FOUND_MSG}")]
    RouteNotFound,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadJson(rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::App(AppError::Domain(err))
    }
}

/// Status code for an application error
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Domain(DomainError::InvalidStateTransition { .. }) => StatusCode::CONFLICT,
        AppError::Domain(DomainError::NodeNotFound(_)) => StatusCode::NOT_FOUND,
        AppError::Domain(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) | AppError::InvalidState(_) => StatusCode::CONFLICT,
        AppError::Execution(_) => StatusCode::BAD_GATEWAY,
        AppError::Database(_)
        | AppError::Io(_)
        | AppError::Serialization(_)
        | AppError::Config(_)
        | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::App(err) => status_for(err),
            ApiError::BadJson(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            // Internal details stay in the log
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "success": false, "msg": msg }))).into_response()
    }
}
