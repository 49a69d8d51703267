// SQLite ShareRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::domain::Share;
use catalyx_core::error::Result;
use catalyx_core::port::ShareRepository;
use sqlx::SqlitePool;

pub struct SqliteShareRepository {
    pool: SqlitePool,
}

impl SqliteShareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for SqliteShareRepository {
    async fn insert(&self, share: &Share) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shares (
                share_id, code, language, file_name, shared_by,
                created_at, expires_at, view_count
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&share.share_id)
        .bind(&share.code)
        .bind(&share.language)
        .bind(&share.file_name)
        .bind(&share.shared_by)
        .bind(share.created_at)
        .bind(share.expires_at)
        .bind(share.view_count)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find(&self, share_id: &str) -> Result<Option<Share>> {
        let row = sqlx::query_as::<_, ShareRow>("SELECT * FROM shares WHERE share_id = ?")
            .bind(share_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ShareRow::into_share))
    }

    async fn increment_views(&self, share_id: &str) -> Result<Option<Share>> {
        let row = sqlx::query_as::<_, ShareRow>(
            "UPDATE shares SET view_count = view_count + 1 WHERE share_id = ? RETURNING *",
        )
        .bind(share_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ShareRow::into_share))
    }

    async fn delete(&self, share_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE share_id = ?")
            .bind(share_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Share>> {
        let rows = sqlx::query_as::<_, ShareRow>(
            "SELECT * FROM shares WHERE shared_by = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ShareRow::into_share).collect())
    }

    async fn delete_expired(&self, now_millis: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM shares WHERE expires_at < ?")
            .bind(now_millis)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShareRow {
    share_id: String,
    code: String,
    language: String,
    file_name: String,
    shared_by: Option<String>,
    created_at: i64,
    expires_at: i64,
    view_count: i64,
}

impl ShareRow {
    fn into_share(self) -> Share {
        Share {
            share_id: self.share_id,
            code: self.code,
            language: self.language,
            file_name: self.file_name,
            shared_by: self.shared_by,
            created_at: self.created_at,
            expires_at: self.expires_at,
            view_count: self.view_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, setup_test_db};
    use catalyx_core::domain::SHARE_TTL_MS;
    use catalyx_core::error::AppError;

    fn share(id: &str, created_at: i64, owner: Option<&str>) -> Share {
        Share::new(id, created_at, "print(1)", "python", "main.py", owner.map(String::from))
    }

    #[tokio::test]
    async fn test_insert_find_and_conflict() {
        let repo = SqliteShareRepository::new(setup_test_db().await);
        let s = share("AbCd1234", 1000, None);
        repo.insert(&s).await.unwrap();

        assert_eq!(repo.find("AbCd1234").await.unwrap(), Some(s.clone()));
        assert!(matches!(
            repo.insert(&s).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_increment_views() {
        let repo = SqliteShareRepository::new(setup_test_db().await);
        repo.insert(&share("AbCd1234", 1000, None)).await.unwrap();

        repo.increment_views("AbCd1234").await.unwrap();
        let s = repo.increment_views("AbCd1234").await.unwrap().unwrap();
        assert_eq!(s.view_count, 2);
        assert!(repo.increment_views("missing1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner_and_expiry_gc() {
        let pool = setup_test_db().await;
        seed_user(&pool, "u1").await;
        let repo = SqliteShareRepository::new(pool);

        repo.insert(&share("Old00001", 1000, Some("u1"))).await.unwrap();
        repo.insert(&share("New00001", 5000, Some("u1"))).await.unwrap();
        repo.insert(&share("Anon0001", 3000, None)).await.unwrap();

        let mine: Vec<_> = repo
            .list_by_owner("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.share_id)
            .collect();
        assert_eq!(mine, vec!["New00001", "Old00001"]);

        let deleted = repo.delete_expired(1000 + SHARE_TTL_MS + 1).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.find("Old00001").await.unwrap().is_none());
        assert!(repo.delete("New00001").await.unwrap());
    }
}
