// Project File Tree
//
// Nested files/folders as edited in the browser. The nested shape is what the
// editor round-trips (`fileTree`); the flat shape (`files`) keeps a parent_id
// per node.

use crate::domain::error::{DomainError, Result};
use crate::domain::language::{editor_language, ProjectLanguage};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Maximum folder nesting accepted from clients
pub const MAX_DEPTH: usize = 32;

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    File,
    Folder,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => write!(f, "file"),
            NodeKind::Folder => write!(f, "folder"),
        }
    }
}

/// A file or folder; folders own their children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: NodeKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<FileNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl FileNode {
    pub fn file(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            language: Some(editor_language(&name)),
            name,
            kind: NodeKind::File,
            content: content.into(),
            children: Vec::new(),
            created_at: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            content: String::new(),
            language: None,
            children: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_children(mut self, children: Vec<FileNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Flat persistence shape: one entry per node with parent and child ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: NodeKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Ordered list of root nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree(Vec<FileNode>);

impl From<Vec<FileNode>> for FileTree {
    fn from(nodes: Vec<FileNode>) -> Self {
        FileTree(nodes)
    }
}

fn find_in<'a>(nodes: &'a [FileNode], id: &str) -> Option<&'a FileNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(nodes: &'a mut [FileNode], id: &str) -> Option<&'a mut FileNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn first_file_in(nodes: &[FileNode]) -> Option<&FileNode> {
    for node in nodes {
        if node.is_file() {
            return Some(node);
        }
        if let Some(found) = first_file_in(&node.children) {
            return Some(found);
        }
    }
    None
}

fn siblings_in<'a>(nodes: &'a [FileNode], id: &str) -> Option<&'a [FileNode]> {
    if nodes.iter().any(|n| n.id == id) {
        return Some(nodes);
    }
    nodes.iter().find_map(|n| siblings_in(&n.children, id))
}

fn remove_in(nodes: &mut Vec<FileNode>, id: &str) -> Option<FileNode> {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|n| remove_in(&mut n.children, id))
}

fn path_in(nodes: &[FileNode], id: &str, prefix: &mut Vec<String>) -> bool {
    for node in nodes {
        prefix.push(node.name.clone());
        if node.id == id || path_in(&node.children, id, prefix) {
            return true;
        }
        prefix.pop();
    }
    false
}

/// Height of a subtree counted in levels (a leaf is 1)
fn height(node: &FileNode) -> usize {
    1 + node.children.iter().map(height).max().unwrap_or(0)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::ValidationError("Name required".to_string()));
    }
    if name.contains('/') {
        return Err(DomainError::ValidationError(format!(
            "Name must not contain '/': {}",
            name
        )));
    }
    Ok(())
}

/// Checks names, leaf-ness of files and id uniqueness for a list of nodes
fn validate_nodes<'a>(
    nodes: &'a [FileNode],
    depth: usize,
    seen: &mut HashSet<&'a str>,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(DomainError::ValidationError(format!(
            "File tree nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    for node in nodes {
        validate_name(&node.name)?;
        if node.id.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "Node '{}' has an empty id",
                node.name
            )));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(DomainError::ValidationError(format!(
                "Duplicate node id: {}",
                node.id
            )));
        }
        if node.is_file() && !node.children.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "File '{}' cannot have children",
                node.name
            )));
        }
        validate_nodes(&node.children, depth + 1, seen)?;
    }
    Ok(())
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single `main.<ext>` file holding `code`
    pub fn default_for(
        language: ProjectLanguage,
        code: impl Into<String>,
        id: impl Into<String>,
        now_millis: i64,
    ) -> Self {
        let name = format!("main.{}", language.extension());
        let mut node = FileNode::file(id, name, code).with_created_at(now_millis);
        node.language = Some(language.as_str().to_string());
        FileTree(vec![node])
    }

    pub fn nodes(&self) -> &[FileNode] {
        &self.0
    }

    pub fn into_nodes(self) -> Vec<FileNode> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn file_count(&self) -> usize {
        fn count(nodes: &[FileNode]) -> usize {
            nodes
                .iter()
                .map(|n| usize::from(n.is_file()) + count(&n.children))
                .sum()
        }
        count(&self.0)
    }

    pub fn find(&self, id: &str) -> Option<&FileNode> {
        find_in(&self.0, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Depth-first, pre-order: the first file the editor opens
    pub fn first_file(&self) -> Option<&FileNode> {
        first_file_in(&self.0)
    }

    /// Slash-joined names from the root down to `id`
    pub fn path_of(&self, id: &str) -> Option<String> {
        let mut parts = Vec::new();
        path_in(&self.0, id, &mut parts).then(|| parts.join("/"))
    }

    pub fn find_by_path(&self, path: &str) -> Option<&FileNode> {
        let mut level: &[FileNode] = &self.0;
        let mut found = None;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let node = level.iter().find(|n| n.name == part)?;
            level = &node.children;
            found = Some(node);
        }
        found
    }

    /// Append `node` at the root (`parent_id == None`) or inside a folder
    pub fn insert(&mut self, parent_id: Option<&str>, node: FileNode) -> Result<()> {
        let subtree = std::slice::from_ref(&node);
        let mut subtree_ids = HashSet::new();
        validate_nodes(subtree, 1, &mut subtree_ids)?;

        if let Some(dup) = subtree_ids.iter().find(|id| self.contains(id)) {
            return Err(DomainError::ValidationError(format!(
                "Duplicate node id: {}",
                dup
            )));
        }

        let (siblings, parent_depth) = match parent_id {
            None => (self.0.as_slice(), 0),
            Some(pid) => {
                let parent = self
                    .find(pid)
                    .ok_or_else(|| DomainError::NodeNotFound(pid.to_string()))?;
                if !parent.is_folder() {
                    return Err(DomainError::ValidationError(format!(
                        "Cannot add '{}' inside file '{}'",
                        node.name, parent.name
                    )));
                }
                let depth = self
                    .path_of(pid)
                    .map(|p| p.split('/').count())
                    .unwrap_or(0);
                (parent.children.as_slice(), depth)
            }
        };

        if siblings.iter().any(|n| n.name == node.name) {
            return Err(DomainError::ValidationError(format!(
                "An item named '{}' already exists here",
                node.name
            )));
        }
        if parent_depth + height(&node) > MAX_DEPTH {
            return Err(DomainError::ValidationError(format!(
                "File tree nested deeper than {} levels",
                MAX_DEPTH
            )));
        }

        match parent_id {
            None => self.0.push(node),
            Some(pid) => {
                if let Some(parent) = find_in_mut(&mut self.0, pid) {
                    parent.children.push(node);
                }
            }
        }
        Ok(())
    }

    /// Remove a node (and its subtree) at any depth
    pub fn remove(&mut self, id: &str) -> Result<FileNode> {
        remove_in(&mut self.0, id).ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let siblings =
            siblings_in(&self.0, id).ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        if siblings.iter().any(|n| n.id != id && n.name == new_name) {
            return Err(DomainError::ValidationError(format!(
                "An item named '{}' already exists here",
                new_name
            )));
        }

        let node = find_in_mut(&mut self.0, id)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        node.name = new_name.to_string();
        if node.is_file() {
            node.language = Some(editor_language(new_name));
        }
        Ok(())
    }

    pub fn update_content(&mut self, file_id: &str, content: impl Into<String>) -> Result<()> {
        let node = find_in_mut(&mut self.0, file_id)
            .ok_or_else(|| DomainError::NodeNotFound(file_id.to_string()))?;
        if !node.is_file() {
            return Err(DomainError::ValidationError(format!(
                "'{}' is a folder, not a file",
                node.name
            )));
        }
        node.content = content.into();
        Ok(())
    }

    /// Well-formedness check for trees received from clients
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        validate_nodes(&self.0, 1, &mut seen)
    }

    /// Pre-order flattening; children keep their order
    pub fn to_flat(&self) -> Vec<FlatFile> {
        fn walk(nodes: &[FileNode], parent: Option<&str>, out: &mut Vec<FlatFile>) {
            for node in nodes {
                out.push(FlatFile {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind,
                    content: node.content.clone(),
                    language: node.language.clone(),
                    parent_id: parent.map(str::to_string),
                    children: node.children.iter().map(|c| c.id.clone()).collect(),
                    created_at: node.created_at,
                });
                walk(&node.children, Some(&node.id), out);
            }
        }

        let mut out = Vec::new();
        walk(&self.0, None, &mut out);
        out
    }

    /// Rebuild the nested tree; siblings keep the order they appear in `files`
    pub fn from_flat(files: &[FlatFile]) -> Result<FileTree> {
        let mut by_parent: HashMap<Option<&str>, Vec<&FlatFile>> = HashMap::new();
        let mut ids = HashSet::new();
        for file in files {
            if !ids.insert(file.id.as_str()) {
                return Err(DomainError::ValidationError(format!(
                    "Duplicate node id: {}",
                    file.id
                )));
            }
        }
        for file in files {
            let parent = file.parent_id.as_deref().filter(|p| !p.is_empty());
            if let Some(pid) = parent {
                if !ids.contains(pid) {
                    return Err(DomainError::ValidationError(format!(
                        "Node '{}' references missing parent {}",
                        file.name, pid
                    )));
                }
            }
            by_parent.entry(parent).or_default().push(file);
        }

        fn build(
            parent: Option<&str>,
            by_parent: &HashMap<Option<&str>, Vec<&FlatFile>>,
            depth: usize,
            placed: &mut usize,
        ) -> Result<Vec<FileNode>> {
            if depth > MAX_DEPTH {
                return Err(DomainError::ValidationError(format!(
                    "File tree nested deeper than {} levels",
                    MAX_DEPTH
                )));
            }
            let Some(entries) = by_parent.get(&parent) else {
                return Ok(Vec::new());
            };
            entries
                .iter()
                .map(|f| {
                    *placed += 1;
                    Ok(FileNode {
                        id: f.id.clone(),
                        name: f.name.clone(),
                        kind: f.kind,
                        content: f.content.clone(),
                        language: f.language.clone(),
                        children: build(Some(f.id.as_str()), by_parent, depth + 1, placed)?,
                        created_at: f.created_at,
                    })
                })
                .collect()
        }

        let mut placed = 0;
        let roots = build(None, &by_parent, 1, &mut placed)?;
        if placed != files.len() {
            // every node has one parent, so unreachable nodes form a cycle
            return Err(DomainError::ValidationError(
                "Flat file list contains a parent cycle".to_string(),
            ));
        }

        let tree = FileTree(roots);
        tree.validate()?;
        Ok(tree)
    }
}
