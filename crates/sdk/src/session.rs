//! Editor session
//!
//! Client-side model of one open project: the local file tree, the file being
//! edited and its buffer. Edits are autosaved after a quiet period.

use crate::client::{CatalyxClient, SaveRequest};
use crate::debounce::Debouncer;
use crate::error::{Result, SdkError};
use crate::types::RunFileResponse;
use catalyx_core::domain::{FileNode, FileTree, NodeKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Quiet period before an edit is saved
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(1500);

/// Pure editor state: tree, active file, buffer and revision counters
#[derive(Debug, Clone)]
pub struct SessionState {
    tree: FileTree,
    active: Option<String>,
    buffer: String,
    revision: u64,
    saved_revision: u64,
}

impl SessionState {
    /// Opens the first file of `tree`, if any
    pub fn new(tree: FileTree) -> Self {
        let mut state = Self {
            tree,
            active: None,
            buffer: String::new(),
            revision: 0,
            saved_revision: 0,
        };
        state.select_first();
        state
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Unsaved edits exist
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    fn select_first(&mut self) {
        match self.tree.first_file() {
            Some(file) => {
                self.active = Some(file.id.clone());
                self.buffer = file.content.clone();
            }
            None => {
                self.active = None;
                self.buffer.clear();
            }
        }
    }

    /// Switch files, keeping the current buffer in the tree
    pub fn select_file(&mut self, file_id: &str) -> Result<()> {
        let node = self
            .tree
            .find(file_id)
            .ok_or_else(|| SdkError::Session(format!("No such file: {}", file_id)))?;
        if !node.is_file() {
            return Err(SdkError::Session(format!("'{}' is a folder", node.name)));
        }

        self.write_back()?;
        // Re-read after write-back; selecting the active file keeps its buffer
        if let Some(node) = self.tree.find(file_id) {
            self.buffer = node.content.clone();
        }
        self.active = Some(file_id.to_string());
        Ok(())
    }

    pub fn edit(&mut self, code: impl Into<String>) {
        self.buffer = code.into();
        self.revision += 1;
    }

    /// Copy the buffer into the active file's node
    pub fn write_back(&mut self) -> Result<()> {
        if let Some(active) = self.active.as_deref() {
            if self.tree.contains(active) {
                self.tree.update_content(active, self.buffer.clone())?;
            }
        }
        Ok(())
    }

    /// `(code, tree, revision)` to send in a save
    pub fn snapshot_for_save(&mut self) -> Result<(String, FileTree, u64)> {
        self.write_back()?;
        Ok((self.buffer.clone(), self.tree.clone(), self.revision))
    }

    /// Record a completed save; later edits stay dirty
    pub fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = self.saved_revision.max(revision);
    }

    /// Adopt the server's tree. The buffer survives while its file exists;
    /// otherwise the first file is opened.
    pub fn replace_tree(&mut self, tree: FileTree) -> Result<()> {
        self.tree = tree;
        let still_open = self
            .active
            .as_deref()
            .and_then(|id| self.tree.find(id))
            .is_some_and(FileNode::is_file);
        if still_open {
            self.write_back()
        } else {
            self.select_first();
            Ok(())
        }
    }
}

struct Inner {
    client: Arc<CatalyxClient>,
    project_id: String,
    state: Mutex<SessionState>,
    /// Serializes saves; held across the request
    save_lock: Mutex<()>,
}

impl Inner {
    /// Waits for any in-flight save, then saves if edits remain.
    /// `Ok(false)` when there was nothing left to save.
    async fn save(&self) -> Result<bool> {
        let _saving = self.save_lock.lock().await;

        let (code, tree, revision) = {
            let mut state = self.state.lock().await;
            if !state.is_dirty() {
                debug!(project_id = %self.project_id, "Nothing to save");
                return Ok(false);
            }
            state.snapshot_for_save()?
        };
        let request = SaveRequest {
            code: Some(code),
            file_tree: Some(tree),
            files: None,
        };
        self.client.save_project(&self.project_id, &request).await?;

        self.state.lock().await.mark_saved(revision);
        debug!(project_id = %self.project_id, revision, "Project saved");
        Ok(true)
    }
}

/// An open project bound to a client
pub struct EditorSession {
    inner: Arc<Inner>,
    autosave: Debouncer,
}

impl EditorSession {
    /// Load a project and open its first file
    pub async fn open(client: Arc<CatalyxClient>, project_id: &str) -> Result<Self> {
        let project = client.get_project(project_id).await?.project;
        let state = SessionState::new(project.effective_tree());

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                project_id: project_id.to_string(),
                state: Mutex::new(state),
                save_lock: Mutex::new(()),
            }),
            autosave: Debouncer::new(AUTOSAVE_DELAY),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Copy of the current state
    pub async fn state(&self) -> SessionState {
        self.inner.state.lock().await.clone()
    }

    /// Replace the buffer and schedule an autosave
    pub async fn edit(&self, code: impl Into<String>) {
        self.inner.state.lock().await.edit(code);

        let inner = self.inner.clone();
        self.autosave.schedule(async move {
            if let Err(e) = inner.save().await {
                warn!(project_id = %inner.project_id, error = %e, "Autosave failed");
            }
        });
    }

    /// Save now, after any save already in flight. `Ok(false)` when no
    /// unsaved edits remained.
    pub async fn save(&self) -> Result<bool> {
        self.autosave.cancel();
        self.inner.save().await
    }

    /// Save if there are unsaved edits, waiting out an in-flight autosave
    pub async fn flush(&self) -> Result<()> {
        self.save().await.map(|_| ())
    }

    pub async fn select_file(&self, file_id: &str) -> Result<()> {
        self.inner.state.lock().await.select_file(file_id)
    }

    /// Create a file or folder on the server and adopt the new tree
    pub async fn add_item(
        &self,
        parent_id: Option<&str>,
        name: &str,
        kind: NodeKind,
    ) -> Result<FileNode> {
        self.flush().await?;
        let resp = self
            .inner
            .client
            .add_node(&self.inner.project_id, parent_id, name, kind)
            .await?;
        self.inner
            .state
            .lock()
            .await
            .replace_tree(resp.project.effective_tree())?;
        Ok(resp.node)
    }

    /// Delete a node on the server; reopens the first file if the active one went away
    pub async fn delete_item(&self, node_id: &str) -> Result<()> {
        self.flush().await?;
        let resp = self
            .inner
            .client
            .delete_node(&self.inner.project_id, node_id)
            .await?;
        self.inner
            .state
            .lock()
            .await
            .replace_tree(resp.project.effective_tree())
    }

    /// Run the active file with the current buffer
    pub async fn run(&self) -> Result<RunFileResponse> {
        let (file_id, code) = {
            let state = self.inner.state.lock().await;
            let file_id = state
                .active_file()
                .ok_or_else(|| SdkError::Session("No file open".to_string()))?
                .to_string();
            (file_id, state.buffer().to_string())
        };
        self.inner
            .client
            .run_file(&self.inner.project_id, &file_id, Some(&code))
            .await
    }

    /// Save pending edits and end the session
    pub async fn close(self) -> Result<()> {
        self.flush().await
    }
}
