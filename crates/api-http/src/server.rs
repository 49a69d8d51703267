//! HTTP Server
//!
//! Router assembly, cross-cutting layers and the serve loop.

use crate::handler;
use crate::rate_limiter::{rate_limit, RequestRateLimiter, DEFAULT_BURST, DEFAULT_PER_SECOND};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use catalyx_core::application::{AuthService, ProjectService, RunService, ShareService};
use std::future::Future;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Origins always allowed by CORS (local frontend dev servers)
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deployed frontend origin, added to the CORS allow-list
    pub frontend_url: Option<String>,
    pub body_limit_mb: usize,
    pub rate_limit_burst: u32,
    pub rate_limit_per_second: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            frontend_url: None,
            body_limit_mb: 10,
            rate_limit_burst: DEFAULT_BURST,
            rate_limit_per_second: DEFAULT_PER_SECOND,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .collect();
        if let Some(url) = self.frontend_url.as_deref() {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() && !origins.iter().any(|o| o == url) {
                origins.push(url.to_string());
            }
        }
        origins
    }
}

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
    pub runs: Arc<RunService>,
    pub shares: Arc<ShareService>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        projects: Arc<ProjectService>,
        runs: Arc<RunService>,
        shares: Arc<ShareService>,
    ) -> Self {
        Self {
            auth,
            projects,
            runs,
            shares,
        }
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// All routes plus the cross-cutting layers
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let body_limit = config.body_limit_mb.max(1) * 1024 * 1024;
    let limiter = Arc::new(RequestRateLimiter::new(
        config.rate_limit_burst,
        config.rate_limit_per_second,
    ));

    Router::new()
        .route("/", get(handler::health))
        // Accounts
        .route("/signUp", post(handler::sign_up))
        .route("/login", post(handler::login))
        .route("/getUserData", post(handler::get_user_data))
        // Projects
        .route("/createProj", post(handler::create_project))
        .route("/saveProject", post(handler::save_project))
        .route("/getProjects", post(handler::get_projects))
        .route("/getProject", post(handler::get_project))
        .route("/deleteProject", post(handler::delete_project))
        .route("/editProject", post(handler::edit_project))
        // File tree
        .route("/addNode", post(handler::add_node))
        .route("/deleteNode", post(handler::delete_node))
        .route("/renameNode", post(handler::rename_node))
        .route("/updateFile", post(handler::update_file))
        // Runs
        .route("/createRunJob", post(handler::create_run_job))
        .route("/updateRunJob", post(handler::update_run_job))
        .route("/getRunHistory", post(handler::get_run_history))
        .route("/deleteRunHistory", post(handler::delete_run_history))
        .route("/createRunSnapshot", post(handler::create_run_snapshot))
        .route("/getRunSnapshots", post(handler::get_run_snapshots))
        .route("/runFile", post(handler::run_file))
        // Shares
        .route("/share", post(handler::create_share))
        .route(
            "/share/{share_id}",
            get(handler::get_share).delete(handler::delete_share),
        )
        .route("/getMyShares", post(handler::get_my_shares))
        .fallback(handler::fallback)
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(CompressionLayer::new())
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(state: AppState, config: ServerConfig, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, origins = ?config.allowed_origins(), "HTTP server listening");

    let app = build_router(state, &config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
