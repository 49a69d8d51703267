//! Restart recovery and scheduled maintenance against a file-backed database

use std::path::PathBuf;
use std::sync::Arc;

use catalyx_core::application::{
    AuthService, MaintenanceScheduler, ProjectService, RecoveryService, RunService, ShareService,
};
use catalyx_core::application::recovery::INTERRUPTED_ERROR;
use catalyx_core::domain::RunStatus;
use catalyx_core::port::auth::mocks::{PlainHasher, StaticTokens};
use catalyx_core::port::code_runner::mocks::MockCodeRunner;
use catalyx_core::port::id_provider::mocks::SequentialIdProvider;
use catalyx_core::port::time_provider::mocks::FixedClock;
use catalyx_core::port::{IdProvider, MaintenanceConfig, RunJobRepository};
use catalyx_infra_sqlite::{
    create_pool, run_migrations, SqliteMaintenance, SqliteProjectRepository,
    SqliteRunJobRepository, SqliteShareRepository, SqliteSnapshotRepository,
    SqliteUserRepository,
};
use sqlx::SqlitePool;

const NOW: i64 = 1_700_000_000_000;
const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Database file removed on drop
struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("catalyx-test-{}.db", uuid::Uuid::new_v4()));
        Self(path)
    }

    fn url(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }

    async fn open(&self) -> SqlitePool {
        let pool = create_pool(&self.url()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.0.display(), suffix));
        }
    }
}

struct Services {
    projects: ProjectService,
    runs: RunService,
    shares: ShareService,
    user_id: String,
}

async fn services(pool: &SqlitePool, clock: Arc<FixedClock>) -> Services {
    let ids: Arc<dyn IdProvider> = Arc::new(SequentialIdProvider::new("id"));
    let auth = AuthService::new(
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(PlainHasher),
        Arc::new(StaticTokens),
        ids.clone(),
        clock.clone(),
    );
    let user_id = auth
        .sign_up("ada@example.com", "secret", "Ada Lovelace")
        .await
        .unwrap();

    let project_repo = Arc::new(SqliteProjectRepository::new(pool.clone()));
    Services {
        projects: ProjectService::new(project_repo.clone(), ids.clone(), clock.clone()),
        runs: RunService::new(
            project_repo,
            Arc::new(SqliteRunJobRepository::new(pool.clone())),
            Arc::new(SqliteSnapshotRepository::new(pool.clone())),
            Arc::new(MockCodeRunner::new_stdout("ok\n")),
            ids.clone(),
            clock.clone(),
        ),
        shares: ShareService::new(Arc::new(SqliteShareRepository::new(pool.clone())), ids, clock),
        user_id,
    }
}

#[tokio::test]
async fn test_restart_fails_interrupted_runs() {
    let db = TempDb::new();
    let clock = Arc::new(FixedClock::new(NOW));

    let (stale_id, queued_id) = {
        let pool = db.open().await;
        let s = services(&pool, clock.clone()).await;
        let project = s.projects.create(&s.user_id, "p", None, None).await.unwrap();

        let stale = s.runs.create_job(&s.user_id, &project.id, None).await.unwrap();
        s.runs
            .update_job(&s.user_id, &stale.id, Some(RunStatus::Running), None, None)
            .await
            .unwrap();
        let queued = s.runs.create_job(&s.user_id, &project.id, None).await.unwrap();

        pool.close().await;
        (stale.id, queued.id)
    };

    // Process comes back ten minutes later
    clock.advance(10 * MINUTE_MS);
    let pool = db.open().await;
    let jobs = Arc::new(SqliteRunJobRepository::new(pool.clone()));

    let recovered = RecoveryService::new(jobs.clone(), clock.clone(), None)
        .recover_interrupted_runs()
        .await
        .unwrap();
    assert_eq!(recovered, 1);

    let stale = jobs.find_by_id(&stale_id).await.unwrap().unwrap();
    assert_eq!(stale.status, RunStatus::Failed);
    assert_eq!(stale.error, INTERRUPTED_ERROR);
    assert_eq!(stale.finished_at, Some(NOW + 10 * MINUTE_MS));

    let queued = jobs.find_by_id(&queued_id).await.unwrap().unwrap();
    assert_eq!(queued.status, RunStatus::Queued);

    // A second pass finds nothing left to recover
    let recovered = RecoveryService::new(jobs, clock, None)
        .recover_interrupted_runs()
        .await
        .unwrap();
    assert_eq!(recovered, 0);
    pool.close().await;
}

#[tokio::test]
async fn test_recent_runs_survive_recovery() {
    let db = TempDb::new();
    let clock = Arc::new(FixedClock::new(NOW));
    let pool = db.open().await;
    let s = services(&pool, clock.clone()).await;
    let project = s.projects.create(&s.user_id, "p", None, None).await.unwrap();

    let job = s.runs.create_job(&s.user_id, &project.id, None).await.unwrap();
    s.runs
        .update_job(&s.user_id, &job.id, Some(RunStatus::Running), None, None)
        .await
        .unwrap();

    clock.advance(MINUTE_MS);
    let jobs = Arc::new(SqliteRunJobRepository::new(pool.clone()));
    let recovered = RecoveryService::new(jobs.clone(), clock, None)
        .recover_interrupted_runs()
        .await
        .unwrap();
    assert_eq!(recovered, 0);

    let job = jobs.find_by_id(&job.id).await.unwrap().unwrap();
    assert_eq!(job.status, RunStatus::Running);
    pool.close().await;
}

#[tokio::test]
async fn test_maintenance_collects_old_runs_and_expired_shares() {
    let db = TempDb::new();
    let clock = Arc::new(FixedClock::new(NOW));
    let pool = db.open().await;
    let s = services(&pool, clock.clone()).await;
    let project = s.projects.create(&s.user_id, "p", None, None).await.unwrap();
    let main_id = project.effective_tree().first_file().unwrap().id.clone();

    let old = s
        .runs
        .run_file(&s.user_id, &project.id, &main_id, None)
        .await
        .unwrap();
    assert!(old.job.is_some());
    s.shares
        .create("print(1)", "python", "main.py", None)
        .await
        .unwrap();

    clock.advance(40 * DAY_MS);
    s.runs
        .run_file(&s.user_id, &project.id, &main_id, None)
        .await
        .unwrap();

    let scheduler = MaintenanceScheduler::new(
        Arc::new(SqliteMaintenance::new(pool.clone(), clock.clone())),
        clock,
        MaintenanceConfig {
            run_retention_days: 30,
            max_db_size_mb: 1024.0,
        },
        24,
    );
    let stats = scheduler.run_now().await.unwrap();

    assert_eq!(stats.run_count, 1);
    assert_eq!(stats.share_count, 0);
    assert_eq!(stats.project_count, 1);
    assert_eq!(stats.user_count, 1);

    let history = s.runs.history(&s.user_id, &project.id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    pool.close().await;
}
