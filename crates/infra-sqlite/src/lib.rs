// CatalyX Infrastructure - SQLite Adapter
// Implements every repository port plus Maintenance

mod connection;
mod error;
mod maintenance_impl;
mod migration;
mod project_repository;
mod run_job_repository;
mod share_repository;
mod snapshot_repository;
mod user_repository;

pub use connection::create_pool;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use project_repository::SqliteProjectRepository;
pub use run_job_repository::SqliteRunJobRepository;
pub use share_repository::SqliteShareRepository;
pub use snapshot_repository::SqliteSnapshotRepository;
pub use user_repository::SqliteUserRepository;

// Note: sqlx::Error conversion goes through error::map_sqlx_error
// (orphan rules: no From<sqlx::Error> for AppError here)

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{create_pool, run_migrations, SqliteUserRepository};
    use catalyx_core::domain::User;
    use catalyx_core::port::UserRepository;
    use sqlx::SqlitePool;

    pub async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    /// Projects and shares reference users
    pub async fn seed_user(pool: &SqlitePool, id: &str) -> User {
        let user = User::new(id, 1000, &format!("{}@example.com", id), id, "hash");
        SqliteUserRepository::new(pool.clone())
            .insert(&user)
            .await
            .unwrap();
        user
    }
}
