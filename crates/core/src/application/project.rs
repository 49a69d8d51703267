// Project & File Tree Use Cases

use crate::domain::{
    FileNode, FileTree, FlatFile, NodeKind, Project, ProjectLanguage, ProjectSummary,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, ProjectRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

pub const NOT_OWNER_MSG: &str = "Unauthorized - you are not the owner of this project";
pub const PROJECT_NOT_FOUND_MSG: &str = "Project not found";

/// Fields of a `saveProject` call; absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct SaveProject {
    pub code: Option<String>,
    pub files: Option<Vec<FlatFile>>,
    pub file_tree: Option<FileTree>,
}

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            projects,
            id_provider,
            time_provider,
        }
    }

    /// Load a project and check that `user_id` owns it
    pub async fn load_owned(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found(PROJECT_NOT_FOUND_MSG))?;

        if !project.is_owned_by(user_id) {
            return Err(AppError::forbidden(NOT_OWNER_MSG));
        }
        Ok(project)
    }

    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
        language: Option<&str>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Project name is required"));
        }
        let language = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(lang) => lang.parse::<ProjectLanguage>()?,
            None => ProjectLanguage::default(),
        };

        let project = Project::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            user_id,
            name,
            description.unwrap_or_default(),
            language,
        );
        self.projects.insert(&project).await?;

        info!(project_id = %project.id, user_id = %user_id, language = %language, "Project created");
        Ok(project)
    }

    pub async fn save(&self, user_id: &str, project_id: &str, changes: SaveProject) -> Result<Project> {
        let mut project = self.load_owned(user_id, project_id).await?;

        if let Some(code) = changes.code {
            project.code = code;
        }
        match (changes.file_tree, changes.files) {
            (Some(tree), files) => {
                tree.validate()?;
                project.files = files.unwrap_or_else(|| tree.to_flat());
                project.file_tree = tree;
            }
            (None, Some(files)) => project.files = files,
            (None, None) => {}
        }
        project.touch(self.time_provider.now_millis());

        self.projects.update(&project).await?;
        info!(project_id = %project.id, files = project.file_tree.file_count(), "Project saved");
        Ok(project)
    }

    /// Owner's projects, most recently updated first
    pub async fn list(&self, user_id: &str) -> Result<Vec<ProjectSummary>> {
        let projects = self.projects.list_by_owner(user_id).await?;
        Ok(projects.iter().map(Project::summary).collect())
    }

    pub async fn get(&self, user_id: &str, project_id: &str) -> Result<Project> {
        self.load_owned(user_id, project_id).await
    }

    pub async fn delete(&self, user_id: &str, project_id: &str) -> Result<()> {
        self.load_owned(user_id, project_id).await?;
        if !self.projects.delete(project_id).await? {
            return Err(AppError::not_found(PROJECT_NOT_FOUND_MSG));
        }
        info!(project_id = %project_id, "Project deleted");
        Ok(())
    }

    pub async fn rename(&self, user_id: &str, project_id: &str, name: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Project name is required"));
        }
        let mut project = self.load_owned(user_id, project_id).await?;
        project.name = name.to_string();
        project.touch(self.time_provider.now_millis());
        self.projects.update(&project).await?;
        Ok(project)
    }

    /// Create a file or folder under `parent_id` (root when `None`)
    pub async fn add_node(
        &self,
        user_id: &str,
        project_id: &str,
        parent_id: Option<&str>,
        name: &str,
        kind: NodeKind,
    ) -> Result<(Project, FileNode)> {
        let now = self.time_provider.now_millis();
        let name = name.trim();
        let node = match kind {
            NodeKind::File => FileNode::file(self.id_provider.generate_id(), name, ""),
            NodeKind::Folder => FileNode::folder(self.id_provider.generate_id(), name),
        }
        .with_created_at(now);

        let created = node.clone();
        let parent_id = parent_id.filter(|p| !p.is_empty());
        let project = self
            .edit_tree(user_id, project_id, |tree| tree.insert(parent_id, node))
            .await?;
        Ok((project, created))
    }

    pub async fn delete_node(&self, user_id: &str, project_id: &str, node_id: &str) -> Result<Project> {
        self.edit_tree(user_id, project_id, |tree| tree.remove(node_id).map(|_| ()))
            .await
    }

    pub async fn rename_node(
        &self,
        user_id: &str,
        project_id: &str,
        node_id: &str,
        name: &str,
    ) -> Result<Project> {
        let name = name.trim();
        self.edit_tree(user_id, project_id, |tree| tree.rename(node_id, name))
            .await
    }

    pub async fn update_file(
        &self,
        user_id: &str,
        project_id: &str,
        file_id: &str,
        content: &str,
    ) -> Result<Project> {
        self.edit_tree(user_id, project_id, |tree| tree.update_content(file_id, content))
            .await
    }

    /// Apply `edit` to the effective tree and persist it on success
    async fn edit_tree<F>(&self, user_id: &str, project_id: &str, edit: F) -> Result<Project>
    where
        F: FnOnce(&mut FileTree) -> crate::domain::error::Result<()>,
    {
        let mut project = self.load_owned(user_id, project_id).await?;
        let mut tree = project.effective_tree();
        edit(&mut tree)?;

        project.set_tree(tree, self.time_provider.now_millis());
        self.projects.update(&project).await?;
        Ok(project)
    }
}
