// Project Domain Model

use crate::domain::file_tree::{FileTree, FlatFile};
use crate::domain::language::ProjectLanguage;
use crate::domain::user::UserId;
use serde::{Deserialize, Serialize};

/// Project ID (UUID v4)
pub type ProjectId = String;

/// A user's project: legacy single-buffer `code` plus the file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    #[serde(rename = "owner_id")]
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: ProjectLanguage,
    #[serde(default)]
    pub file_tree: FileTree,
    #[serde(default)]
    pub files: Vec<FlatFile>,
    #[serde(rename = "created_at")]
    pub created_at: i64, // epoch ms
    #[serde(rename = "updated_at")]
    pub updated_at: i64,
}

/// Listing row for `getProjects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub language: ProjectLanguage,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Project {
    /// New project seeded with the language's starter code in `main.<ext>`
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        owner_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        language: ProjectLanguage,
    ) -> Self {
        let id = id.into();
        let code = language.starter_code().to_string();
        let file_tree = FileTree::default_for(language, code.clone(), default_file_id(&id), created_at);
        let files = file_tree.to_flat();

        Self {
            id,
            owner_id: owner_id.into(),
            name: name.into(),
            description: description.into(),
            code,
            language,
            file_tree,
            files,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// The stored tree, or the single-file default built from `code` when it is empty
    pub fn effective_tree(&self) -> FileTree {
        if self.file_tree.is_empty() {
            FileTree::default_for(
                self.language,
                self.code.clone(),
                default_file_id(&self.id),
                self.created_at,
            )
        } else {
            self.file_tree.clone()
        }
    }

    /// Replace the tree and keep the flat copy in sync
    pub fn set_tree(&mut self, tree: FileTree, now_millis: i64) {
        self.files = tree.to_flat();
        self.file_tree = tree;
        self.touch(now_millis);
    }

    pub fn touch(&mut self, now_millis: i64) {
        self.updated_at = now_millis;
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            language: self.language,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Stable id of the default `main.<ext>` node so clients can address it
fn default_file_id(project_id: &str) -> String {
    format!("{}-main", project_id)
}
