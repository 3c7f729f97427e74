//! In-memory document tree.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use termuxfm_core::error::AppError;
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::document::{DocumentId, DocumentInfo, DocumentTree};

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<DocumentId>,
    is_directory: bool,
    content: Bytes,
    last_modified: DateTime<Utc>,
    children: Vec<DocumentId>,
}

#[derive(Debug)]
struct TreeState {
    nodes: HashMap<DocumentId, Node>,
    root: DocumentId,
    next_id: u64,
}

impl TreeState {
    fn node(&self, id: &DocumentId) -> AppResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("Document not found: {id}")))
    }

    fn directory(&self, id: &DocumentId) -> AppResult<&Node> {
        let node = self.node(id)?;
        if !node.is_directory {
            return Err(AppError::invalid_path(format!(
                "Document is not a directory: {id}"
            )));
        }
        Ok(node)
    }

    fn child_named(&self, parent: &DocumentId, name: &str) -> Option<&DocumentId> {
        self.nodes.get(parent)?.children.iter().find(|child| {
            self.nodes
                .get(*child)
                .is_some_and(|node| node.name == name)
        })
    }

    fn info(&self, id: &DocumentId) -> Option<DocumentInfo> {
        self.nodes.get(id).map(|node| DocumentInfo {
            id: id.clone(),
            name: Some(node.name.clone()),
            is_directory: node.is_directory,
            size: node.content.len() as u64,
            last_modified: Some(node.last_modified),
        })
    }

    fn insert_child(
        &mut self,
        parent: &DocumentId,
        name: &str,
        is_directory: bool,
    ) -> AppResult<DocumentInfo> {
        self.directory(parent)?;
        if self.child_named(parent, name).is_some() {
            return Err(AppError::already_exists(format!(
                "A document named '{name}' already exists"
            )));
        }

        self.next_id += 1;
        let id = DocumentId::new(format!("doc:{}", self.next_id));
        self.nodes.insert(
            id.clone(),
            Node {
                name: name.to_string(),
                parent: Some(parent.clone()),
                is_directory,
                content: Bytes::new(),
                last_modified: Utc::now(),
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id.clone());
        }
        self.info(&id)
            .ok_or_else(|| AppError::internal("Inserted document vanished"))
    }

    fn remove_subtree(&mut self, id: &DocumentId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }
}

/// A document tree held entirely in memory.
///
/// Clones share the same tree. Names are unique per directory: creating
/// or renaming onto an existing name fails with `AlreadyExists`.
#[derive(Debug, Clone)]
pub struct MemoryDocumentTree {
    state: Arc<RwLock<TreeState>>,
    granted: bool,
}

impl MemoryDocumentTree {
    /// Create an empty, granted tree.
    pub fn new() -> Self {
        Self::with_grant(true)
    }

    /// Create a tree whose root is not granted: `root()` returns `None`.
    pub fn unbound() -> Self {
        Self::with_grant(false)
    }

    fn with_grant(granted: bool) -> Self {
        let root = DocumentId::new("doc:root");
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            Node {
                name: String::new(),
                parent: None,
                is_directory: true,
                content: Bytes::new(),
                last_modified: Utc::now(),
                children: Vec::new(),
            },
        );
        Self {
            state: Arc::new(RwLock::new(TreeState {
                nodes,
                root,
                next_id: 0,
            })),
            granted,
        }
    }

    /// Number of documents, including the root.
    pub async fn len(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Whether the tree holds nothing but its root.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 1
    }
}

impl Default for MemoryDocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentTree for MemoryDocumentTree {
    async fn root(&self) -> AppResult<Option<DocumentInfo>> {
        if !self.granted {
            return Ok(None);
        }
        let state = self.state.read().await;
        Ok(state.info(&state.root))
    }

    async fn find_child(
        &self,
        parent: &DocumentId,
        name: &str,
    ) -> AppResult<Option<DocumentInfo>> {
        let state = self.state.read().await;
        state.directory(parent)?;
        Ok(state
            .child_named(parent, name)
            .and_then(|id| state.info(id)))
    }

    async fn list_children(&self, parent: &DocumentId) -> AppResult<Vec<DocumentInfo>> {
        let state = self.state.read().await;
        let node = state.directory(parent)?;
        Ok(node
            .children
            .iter()
            .filter_map(|id| state.info(id))
            .collect())
    }

    async fn create_directory(&self, parent: &DocumentId, name: &str) -> AppResult<DocumentInfo> {
        self.state.write().await.insert_child(parent, name, true)
    }

    async fn create_file(
        &self,
        parent: &DocumentId,
        _mime_type: &str,
        name: &str,
    ) -> AppResult<DocumentInfo> {
        self.state.write().await.insert_child(parent, name, false)
    }

    async fn delete(&self, id: &DocumentId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if *id == state.root {
            return Err(AppError::invalid_path("The tree root cannot be deleted"));
        }
        let parent = state.node(id)?.parent.clone();
        state.remove_subtree(id);
        if let Some(parent_node) = parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent_node.children.retain(|child| child != id);
        }
        Ok(())
    }

    async fn rename(&self, id: &DocumentId, new_name: &str) -> AppResult<DocumentInfo> {
        let mut state = self.state.write().await;
        let parent = state.node(id)?.parent.clone().ok_or_else(|| {
            AppError::invalid_path("The tree root cannot be renamed")
        })?;
        if let Some(existing) = state.child_named(&parent, new_name) {
            if existing != id {
                return Err(AppError::already_exists(format!(
                    "A document named '{new_name}' already exists"
                )));
            }
        }
        if let Some(node) = state.nodes.get_mut(id) {
            node.name = new_name.to_string();
            node.last_modified = Utc::now();
        }
        state
            .info(id)
            .ok_or_else(|| AppError::not_found(format!("Document not found: {id}")))
    }

    async fn read(&self, id: &DocumentId) -> AppResult<Bytes> {
        let state = self.state.read().await;
        let node = state.node(id)?;
        if node.is_directory {
            return Err(AppError::invalid_path(format!(
                "Document is a directory: {id}"
            )));
        }
        Ok(node.content.clone())
    }

    async fn write(&self, id: &DocumentId, data: Bytes) -> AppResult<()> {
        let mut state = self.state.write().await;
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Document not found: {id}")))?;
        if node.is_directory {
            return Err(AppError::invalid_path(format!(
                "Document is a directory: {id}"
            )));
        }
        node.content = data;
        node.last_modified = Utc::now();
        Ok(())
    }

    fn local_path(&self, _id: &DocumentId) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termuxfm_core::error::ErrorKind;

    #[tokio::test]
    async fn test_unbound_has_no_root() {
        assert!(MemoryDocumentTree::unbound().root().await.unwrap().is_none());
        assert!(MemoryDocumentTree::new().root().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_names_unique_per_directory() {
        let tree = MemoryDocumentTree::new();
        let root = tree.root().await.unwrap().unwrap().id;

        let dir = tree.create_directory(&root, "Scripts").await.unwrap();
        let err = tree.create_file(&root, "text/plain", "Scripts").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        // The same name is fine in a different directory.
        tree.create_file(&dir.id, "text/plain", "Scripts").await.unwrap();
        assert_eq!(tree.list_children(&dir.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_subtree() {
        let tree = MemoryDocumentTree::new();
        let root = tree.root().await.unwrap().unwrap().id;
        let dir = tree.create_directory(&root, "d").await.unwrap();
        let sub = tree.create_directory(&dir.id, "e").await.unwrap();
        tree.create_file(&sub.id, "text/plain", "f").await.unwrap();
        assert_eq!(tree.len().await, 4);

        tree.delete(&dir.id).await.unwrap();
        assert!(tree.is_empty().await);
        assert!(tree.find_child(&root, "d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let tree = MemoryDocumentTree::new();
        let root = tree.root().await.unwrap().unwrap().id;
        let file = tree.create_file(&root, "text/plain", "a.txt").await.unwrap();

        tree.write(&file.id, Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(tree.read(&file.id).await.unwrap(), Bytes::from_static(b"abc"));
        let info = tree.find_child(&root, "a.txt").await.unwrap().unwrap();
        assert_eq!(info.size, 3);
    }
}
