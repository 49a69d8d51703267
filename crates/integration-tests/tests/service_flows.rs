//! Cross-crate flows: application services over SQLite with mock adapters

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use catalyx_core::application::share::MAX_SHARE_ID_ATTEMPTS;
use catalyx_core::application::{
    AuthService, ProjectService, RunService, SaveProject, ShareService,
};
use catalyx_core::domain::{DomainError, FileNode, NodeKind, PreviewKind, RunStatus};
use catalyx_core::port::auth::mocks::{PlainHasher, StaticTokens};
use catalyx_core::port::code_runner::mocks::{MockBehavior, MockCodeRunner};
use catalyx_core::port::id_provider::mocks::SequentialIdProvider;
use catalyx_core::port::time_provider::mocks::FixedClock;
use catalyx_core::port::{ExecutionError, IdProvider, PasswordHasher};
use catalyx_core::AppError;
use catalyx_infra_sqlite::{
    create_pool, run_migrations, SqliteProjectRepository, SqliteRunJobRepository,
    SqliteShareRepository, SqliteSnapshotRepository, SqliteUserRepository,
};

const NOW: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

struct Harness {
    auth: AuthService,
    projects: ProjectService,
    runs: RunService,
    shares: ShareService,
    runner: Arc<MockCodeRunner>,
    clock: Arc<FixedClock>,
}

async fn harness() -> Harness {
    harness_with_ids(SequentialIdProvider::new("id")).await
}

async fn harness_with_ids(ids: SequentialIdProvider) -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedClock::new(NOW));
    let ids: Arc<dyn IdProvider> = Arc::new(ids);
    let runner = Arc::new(MockCodeRunner::new_stdout("Hello World\n"));
    let project_repo = Arc::new(SqliteProjectRepository::new(pool.clone()));

    Harness {
        auth: AuthService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            Arc::new(PlainHasher),
            Arc::new(StaticTokens),
            ids.clone(),
            clock.clone(),
        ),
        projects: ProjectService::new(project_repo.clone(), ids.clone(), clock.clone()),
        runs: RunService::new(
            project_repo,
            Arc::new(SqliteRunJobRepository::new(pool.clone())),
            Arc::new(SqliteSnapshotRepository::new(pool.clone())),
            runner.clone(),
            ids.clone(),
            clock.clone(),
        ),
        shares: ShareService::new(Arc::new(SqliteShareRepository::new(pool)), ids, clock.clone()),
        runner,
        clock,
    }
}

/// Sign up and log in, returning the user id
async fn register(h: &Harness, email: &str) -> String {
    h.auth.sign_up(email, "secret", "Ada Lovelace").await.unwrap();
    let login = h.auth.login(email, "secret").await.unwrap();
    let user = h.auth.authenticate(Some(&login.token)).await.unwrap();
    user.id
}

#[tokio::test]
async fn test_account_lifecycle() {
    let h = harness().await;

    let user_id = h
        .auth
        .sign_up("  Ada@Example.COM ", "secret", "Ada Lovelace")
        .await
        .unwrap();

    // Emails are normalized on both sign-up and login
    let login = h.auth.login("ada@example.com", "secret").await.unwrap();
    assert_eq!(login.user.id, user_id);

    let profile = h.auth.get_user_data(Some(&login.token)).await.unwrap();
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.name, "Ada Lovelace");

    let dup = h.auth.sign_up("ada@example.com", "x", "Other").await;
    assert!(matches!(dup, Err(AppError::Validation(_))));

    let bad = h.auth.login("ada@example.com", "wrong").await;
    assert!(matches!(bad, Err(AppError::Unauthorized(_))));

    assert!(h.auth.authenticate(None).await.is_err());
    assert!(h.auth.authenticate(Some("garbage")).await.is_err());
}

/// Hashes only once a task on the async runtime has seen it start.
/// Running on the runtime's only worker thread times out instead.
struct HandshakeHasher {
    started: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
}

impl HandshakeHasher {
    fn wait_for_release(&self) -> Result<(), AppError> {
        self.started.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(2);
        while !self.released.load(Ordering::SeqCst) {
            if Instant::now() > deadline {
                return Err(AppError::Internal("hash blocked the async worker".to_string()));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

impl PasswordHasher for HandshakeHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        self.wait_for_release()?;
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        self.wait_for_release()?;
        Ok(hash == format!("plain${}", password))
    }
}

/// Arms a runtime task that releases the hasher after it starts
fn release_once_started(started: &Arc<AtomicBool>, released: &Arc<AtomicBool>) {
    started.store(false, Ordering::SeqCst);
    released.store(false, Ordering::SeqCst);
    let (started, released) = (started.clone(), released.clone());
    tokio::spawn(async move {
        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        released.store(true, Ordering::SeqCst);
    });
}

#[tokio::test]
async fn test_password_hashing_leaves_runtime_free() {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let started = Arc::new(AtomicBool::new(false));
    let released = Arc::new(AtomicBool::new(false));

    let auth = AuthService::new(
        Arc::new(SqliteUserRepository::new(pool)),
        Arc::new(HandshakeHasher {
            started: started.clone(),
            released: released.clone(),
        }),
        Arc::new(StaticTokens),
        Arc::new(SequentialIdProvider::new("id")),
        Arc::new(FixedClock::new(NOW)),
    );

    release_once_started(&started, &released);
    let user_id = auth
        .sign_up("ada@example.com", "secret", "Ada Lovelace")
        .await
        .unwrap();

    release_once_started(&started, &released);
    let login = auth.login("ada@example.com", "secret").await.unwrap();
    assert_eq!(login.user.id, user_id);
}

#[tokio::test]
async fn test_project_tree_editing() {
    let h = harness().await;
    let user = register(&h, "ada@example.com").await;

    let project = h
        .projects
        .create(&user, "Hello", Some("demo"), Some("python"))
        .await
        .unwrap();
    let main = project.effective_tree().first_file().unwrap().clone();
    assert_eq!(main.name, "main.py");

    let (project, folder) = h
        .projects
        .add_node(&user, &project.id, None, "lib", NodeKind::Folder)
        .await
        .unwrap();
    let (_, helper) = h
        .projects
        .add_node(&user, &project.id, Some(&folder.id), "helper.py", NodeKind::File)
        .await
        .unwrap();

    let project = h
        .projects
        .update_file(&user, &project.id, &helper.id, "VALUE = 42")
        .await
        .unwrap();
    let tree = project.effective_tree();
    assert_eq!(tree.path_of(&helper.id).as_deref(), Some("lib/helper.py"));
    assert_eq!(tree.find(&helper.id).unwrap().content, "VALUE = 42");
    assert_eq!(project.files.len(), 3);

    let project = h
        .projects
        .rename_node(&user, &project.id, &helper.id, "consts.py")
        .await
        .unwrap();
    assert!(project.effective_tree().find_by_path("lib/consts.py").is_some());

    // Files cannot contain children
    let nested = h
        .projects
        .add_node(&user, &project.id, Some(&helper.id), "x.py", NodeKind::File)
        .await;
    assert!(nested.is_err());

    let project = h
        .projects
        .delete_node(&user, &project.id, &folder.id)
        .await
        .unwrap();
    let tree = project.effective_tree();
    assert!(!tree.contains(&folder.id));
    assert!(!tree.contains(&helper.id));
    assert_eq!(tree.file_count(), 1);

    let missing = h
        .projects
        .delete_node(&user, &project.id, "no-such-node")
        .await;
    assert!(matches!(
        missing,
        Err(AppError::Domain(DomainError::NodeNotFound(_)))
    ));

    let listed = h.projects.list(&user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Hello");
}

#[tokio::test]
async fn test_save_replaces_tree_and_code() {
    let h = harness().await;
    let user = register(&h, "ada@example.com").await;
    let project = h.projects.create(&user, "Save", None, None).await.unwrap();

    let mut tree = project.effective_tree();
    let main_id = tree.first_file().unwrap().id.clone();
    tree.update_content(&main_id, "print('saved')").unwrap();
    tree.insert(None, FileNode::file("notes", "notes.txt", "todo"))
        .unwrap();

    let saved = h
        .projects
        .save(
            &user,
            &project.id,
            SaveProject {
                code: Some("print('saved')".to_string()),
                file_tree: Some(tree),
                files: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.code, "print('saved')");
    assert_eq!(saved.files.len(), 2);

    let reloaded = h.projects.get(&user, &project.id).await.unwrap();
    assert_eq!(reloaded.file_tree, saved.file_tree);
    assert_eq!(
        reloaded.file_tree.find(&main_id).unwrap().content,
        "print('saved')"
    );
}

#[tokio::test]
async fn test_projects_are_private() {
    let h = harness().await;
    let owner = register(&h, "owner@example.com").await;
    let intruder = register(&h, "intruder@example.com").await;

    let project = h.projects.create(&owner, "Mine", None, None).await.unwrap();

    let read = h.projects.get(&intruder, &project.id).await;
    assert!(matches!(read, Err(AppError::Forbidden(_))));

    let run = h.runs.create_job(&intruder, &project.id, None).await;
    assert!(matches!(run, Err(AppError::Forbidden(_))));

    let del = h.projects.delete(&intruder, &project.id).await;
    assert!(matches!(del, Err(AppError::Forbidden(_))));

    h.projects.delete(&owner, &project.id).await.unwrap();
    let gone = h.projects.get(&owner, &project.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_client_reported_run_lifecycle() {
    let h = harness().await;
    let user = register(&h, "ada@example.com").await;
    let project = h.projects.create(&user, "Runs", None, None).await.unwrap();

    let job = h.runs.create_job(&user, &project.id, None).await.unwrap();
    assert_eq!(job.status, RunStatus::Queued);
    assert_eq!(job.entry_point, "main");

    h.clock.advance(10);
    let job = h
        .runs
        .update_job(&user, &job.id, Some(RunStatus::Running), None, None)
        .await
        .unwrap();
    assert_eq!(job.started_at, Some(NOW + 10));

    h.clock.advance(250);
    let job = h
        .runs
        .update_job(
            &user,
            &job.id,
            Some(RunStatus::Success),
            Some("done\n".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(job.finished_at, Some(NOW + 260));
    assert_eq!(job.output, "done\n");

    // Finished runs are immutable
    let again = h
        .runs
        .update_job(&user, &job.id, Some(RunStatus::Running), None, None)
        .await;
    assert!(matches!(
        again,
        Err(AppError::Domain(DomainError::InvalidStateTransition { .. }))
    ));

    let snapshot = h
        .runs
        .create_snapshot(
            &user,
            &job.id,
            &project.id,
            Some("https://files.example.com/out.txt".to_string()),
            None,
        )
        .await
        .unwrap();
    let snapshots = h.runs.snapshots(&user, &job.id).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].id, snapshot.id);

    h.runs.create_job(&user, &project.id, Some("tests")).await.unwrap();
    let history = h.runs.history(&user, &project.id, None).await.unwrap();
    assert_eq!(history.len(), 2);

    let deleted = h
        .runs
        .delete_history(&user, &project.id, "main")
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    let history = h.runs.history(&user, &project.id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry_point, "tests");
}

#[tokio::test]
async fn test_run_file_executes_and_previews() {
    let h = harness().await;
    let user = register(&h, "ada@example.com").await;
    let project = h.projects.create(&user, "Exec", None, Some("python")).await.unwrap();
    let main_id = project.effective_tree().first_file().unwrap().id.clone();

    let result = h
        .runs
        .run_file(&user, &project.id, &main_id, Some("print('hi')".to_string()))
        .await
        .unwrap();
    assert!(!result.has_error);
    assert_eq!(result.output, "Hello World\n");
    let job = result.job.unwrap();
    assert_eq!(job.status, RunStatus::Success);
    assert_eq!(job.entry_point, "main.py");

    let request = h.runner.last_request().unwrap();
    assert_eq!(request.language, "python3");
    assert_eq!(request.content, "print('hi')");

    // Text files are rendered locally and create no run
    let (_, notes) = h
        .projects
        .add_node(&user, &project.id, None, "notes.md", NodeKind::File)
        .await
        .unwrap();
    h.projects
        .update_file(&user, &project.id, &notes.id, "# Notes")
        .await
        .unwrap();
    let preview = h
        .runs
        .run_file(&user, &project.id, &notes.id, None)
        .await
        .unwrap();
    assert_eq!(preview.preview, Some(PreviewKind::Text));
    assert!(preview.job.is_none());
    assert_eq!(preview.output, "# Notes");
    assert_eq!(h.runner.call_count(), 1);

    // Upstream failures finish the run as failed
    h.runner
        .set_behavior(MockBehavior::Fail(ExecutionError::Timeout));
    let failed = h
        .runs
        .run_file(&user, &project.id, &main_id, None)
        .await
        .unwrap();
    assert!(failed.has_error);
    assert_eq!(failed.job.unwrap().status, RunStatus::Failed);

    let history = h.runs.history(&user, &project.id, None).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_share_lifecycle() {
    let h = harness().await;
    let owner = register(&h, "owner@example.com").await;
    let other = register(&h, "other@example.com").await;

    let share = h
        .shares
        .create("print(1)", "python", "main.py", Some(owner.clone()))
        .await
        .unwrap();
    let anonymous = h
        .shares
        .create("x = 1", "python", "x.py", None)
        .await
        .unwrap();
    assert!(anonymous.shared_by.is_none());

    let view = h.shares.get(&share.share_id).await.unwrap();
    assert_eq!(view.view_count, 1);
    let view = h.shares.get(&share.share_id).await.unwrap();
    assert_eq!(view.view_count, 2);

    let mine = h.shares.my_shares(&owner).await.unwrap();
    assert_eq!(mine.len(), 1);

    let denied = h.shares.delete(&other, &share.share_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    h.shares.delete(&owner, &share.share_id).await.unwrap();
    assert!(matches!(
        h.shares.get(&share.share_id).await,
        Err(AppError::NotFound(_))
    ));

    // Shares expire after 30 days and are dropped on access
    h.clock.advance(31 * DAY_MS);
    match h.shares.get(&anonymous.share_id).await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Share has expired"),
        other => panic!("expected expiry, got {:?}", other),
    }
    match h.shares.get(&anonymous.share_id).await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Share not found"),
        other => panic!("expected removal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_share_token_for_missing_user_is_anonymous() {
    let h = harness().await;
    let owner = register(&h, "owner@example.com").await;

    let owner_token = format!("tok:{}", owner);
    assert_eq!(h.auth.try_user_id(Some(&owner_token)).await, Some(owner));
    assert_eq!(h.auth.try_user_id(Some("tok:ghost")).await, None);
    assert_eq!(h.auth.try_user_id(Some("garbage")).await, None);
    assert_eq!(h.auth.try_user_id(None).await, None);

    let shared_by = h.auth.try_user_id(Some("tok:ghost")).await;
    let share = h
        .shares
        .create("x = 1", "python", "x.py", shared_by)
        .await
        .unwrap();
    assert!(share.shared_by.is_none());
}

#[tokio::test]
async fn test_share_id_collision_retries() {
    let ids =
        SequentialIdProvider::new("id").with_share_ids(&["Dup00001", "Dup00001", "Fresh001"]);
    let h = harness_with_ids(ids).await;

    let first = h
        .shares
        .create("print(1)", "python", "a.py", None)
        .await
        .unwrap();
    assert_eq!(first.share_id, "Dup00001");

    let second = h
        .shares
        .create("print(2)", "python", "b.py", None)
        .await
        .unwrap();
    assert_eq!(second.share_id, "Fresh001");

    let view = h.shares.get("Dup00001").await.unwrap();
    assert_eq!(view.code, "print(1)");
    let view = h.shares.get("Fresh001").await.unwrap();
    assert_eq!(view.code, "print(2)");
}

#[tokio::test]
async fn test_share_id_collisions_exhaust_attempts() {
    let taken = vec!["Dup00001"; MAX_SHARE_ID_ATTEMPTS + 1];
    let h = harness_with_ids(SequentialIdProvider::new("id").with_share_ids(&taken)).await;

    h.shares
        .create("print(1)", "python", "a.py", None)
        .await
        .unwrap();
    let result = h.shares.create("print(2)", "python", "b.py", None).await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    // The original share is untouched
    let view = h.shares.get("Dup00001").await.unwrap();
    assert_eq!(view.code, "print(1)");
}
