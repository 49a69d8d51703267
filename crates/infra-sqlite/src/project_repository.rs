// SQLite ProjectRepository Implementation
// fileTree / files are stored as JSON text columns

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalyx_core::domain::{FileTree, FlatFile, Project};
use catalyx_core::error::{AppError, Result};
use catalyx_core::port::ProjectRepository;
use sqlx::SqlitePool;
use tracing::warn;

pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn tree_json(project: &Project) -> Result<(String, String)> {
    Ok((
        serde_json::to_string(&project.file_tree)?,
        serde_json::to_string(&project.files)?,
    ))
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn insert(&self, project: &Project) -> Result<()> {
        let (file_tree, files) = tree_json(project)?;

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, owner_id, name, description, code, language,
                file_tree, files, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.owner_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.code)
        .bind(project.language.as_str())
        .bind(file_tree)
        .bind(files)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(ProjectRow::into_project).transpose()
    }

    async fn update(&self, project: &Project) -> Result<()> {
        let (file_tree, files) = tree_json(project)?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = ?, description = ?, code = ?, language = ?,
                file_tree = ?, files = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.code)
        .bind(project.language.as_str())
        .bind(file_tree)
        .bind(files)
        .bind(project.updated_at)
        .bind(&project.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Project not found"));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        // run_jobs and run_snapshots cascade
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE owner_id = ? ORDER BY updated_at DESC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ProjectRow::into_project).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: String,
    owner_id: String,
    name: String,
    description: String,
    code: String,
    language: String,
    file_tree: String,
    files: String,
    created_at: i64,
    updated_at: i64,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project> {
        let language = self.language.parse().unwrap_or_else(|_| {
            warn!(project_id = %self.id, language = %self.language, "Unknown stored language");
            Default::default()
        });
        let file_tree: FileTree = serde_json::from_str(&self.file_tree)?;
        let files: Vec<FlatFile> = serde_json::from_str(&self.files)?;

        Ok(Project {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            code: self.code,
            language,
            file_tree,
            files,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
