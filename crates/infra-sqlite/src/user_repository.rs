// SQLite UserRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::domain::User;
use catalyx_core::error::Result;
use catalyx_core::port::UserRepository;
use sqlx::SqlitePool;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_user))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_test_db;
    use catalyx_core::error::AppError;

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = SqliteUserRepository::new(setup_test_db().await);
        let user = User::new("u1", 1000, "ada@example.com", "Ada", "hash");
        repo.insert(&user).await.unwrap();

        assert_eq!(repo.find_by_id("u1").await.unwrap(), Some(user.clone()));
        assert_eq!(
            repo.find_by_email("ada@example.com").await.unwrap(),
            Some(user)
        );
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = SqliteUserRepository::new(setup_test_db().await);
        repo.insert(&User::new("u1", 1000, "ada@example.com", "Ada", "h"))
            .await
            .unwrap();

        let err = repo
            .insert(&User::new("u2", 2000, "ada@example.com", "Other", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
