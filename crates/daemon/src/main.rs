//! CatalyX IDE Backend - Server Entry Point

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

// Import workspace crates
use catalyx_api_http::AppState;
use catalyx_core::application::{
    AuthService, MaintenanceScheduler, ProjectService, RecoveryService, RunService, ShareService,
};
use catalyx_core::port::{IdProvider, SystemTimeProvider, TimeProvider, UuidProvider};
use catalyx_infra_auth::{Argon2Hasher, JwtTokenService};
use catalyx_infra_piston::PistonRunner;
use catalyx_infra_sqlite::{
    create_pool, run_migrations, SqliteMaintenance, SqliteProjectRepository,
    SqliteRunJobRepository, SqliteShareRepository, SqliteSnapshotRepository,
    SqliteUserRepository,
};

use crate::config::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "catalyx-server", version, about = "CatalyX IDE backend server")]
struct Args {
    /// Config file (TOML); defaults to ./catalyx.toml when present
    #[arg(long, short, env = "CATALYX_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env before anything reads the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("loading .env");
        }
    }

    let args = Args::parse();

    // 1. Configuration
    let settings = Settings::load(args.config.as_deref())?;

    // 2. Logging
    let telemetry_guard = telemetry::init(&settings.log)?;
    info!("CatalyX server v{} starting...", VERSION);

    if settings.uses_default_secret() {
        warn!("auth.jwt_secret is the built-in placeholder; set CATALYX__AUTH__JWT_SECRET");
    }

    // 3. Database
    let db_url = settings.database_url();
    info!(db_url = %db_url, "Initializing database...");
    if !db_url.starts_with("sqlite:") {
        let db_path = PathBuf::from(&db_url);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }

    let pool = create_pool(&db_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UuidProvider);

    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let projects = Arc::new(SqliteProjectRepository::new(pool.clone()));
    let jobs = Arc::new(SqliteRunJobRepository::new(pool.clone()));
    let snapshots = Arc::new(SqliteSnapshotRepository::new(pool.clone()));
    let shares = Arc::new(SqliteShareRepository::new(pool.clone()));

    let runner = Arc::new(
        PistonRunner::new(settings.piston_config())
            .map_err(|e| anyhow::anyhow!("Piston client setup failed: {}", e))?,
    );
    let tokens = Arc::new(JwtTokenService::new(
        &settings.auth.jwt_secret,
        settings.auth.token_ttl_days,
    ));

    let state = AppState::new(
        Arc::new(AuthService::new(
            users,
            Arc::new(Argon2Hasher::new()),
            tokens,
            id_provider.clone(),
            time_provider.clone(),
        )),
        Arc::new(ProjectService::new(
            projects.clone(),
            id_provider.clone(),
            time_provider.clone(),
        )),
        Arc::new(RunService::new(
            projects,
            jobs.clone(),
            snapshots,
            runner,
            id_provider.clone(),
            time_provider.clone(),
        )),
        Arc::new(ShareService::new(shares, id_provider, time_provider.clone())),
    );

    // 5. Fail runs orphaned by a previous process
    info!("Running crash recovery...");
    let recovery = RecoveryService::new(jobs, time_provider.clone(), None);
    match recovery.recover_interrupted_runs().await {
        Ok(count) => info!(recovered_runs = count, "Crash recovery completed"),
        Err(e) => error!(error = ?e, "Crash recovery failed"),
    }

    // 6. Maintenance scheduler
    let maintenance = Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone()));
    let scheduler = MaintenanceScheduler::new(
        maintenance,
        time_provider,
        settings.maintenance_config(),
        settings.maintenance.interval_hours,
    );
    let maintenance_handle = tokio::spawn(scheduler.run());

    // 7. HTTP server until Ctrl+C
    let server_config = settings.server_config();
    info!(addr = %server_config.addr(), "Starting HTTP server...");
    catalyx_api_http::serve(state, server_config, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // 8. Graceful shutdown
    maintenance_handle.abort();
    pool.close().await;
    info!("Shutdown complete.");
    telemetry_guard.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received. Exiting gracefully..."),
        Err(e) => error!(error = ?e, "Failed to listen for shutdown signal"),
    }
}
