//! Document-tree storage provider.
//!
//! Resolves logical paths by walking the tree one `find_child` lookup per
//! segment from the granted root. Failures are surfaced as they are; the
//! grant governs access, so there is no repair or retry here.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use termuxfm_core::error::{AppError, ErrorKind};
use termuxfm_core::path;
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::document::{DocumentInfo, DocumentTree};
use termuxfm_core::traits::storage::{FileItem, StorageProvider, sort_listing};

use super::mime_from_name;

/// Storage provider over a granted document tree.
#[derive(Debug, Clone)]
pub struct DocumentTreeStorageProvider {
    tree: Option<Arc<dyn DocumentTree>>,
}

impl DocumentTreeStorageProvider {
    /// Create a provider over `tree`.
    pub fn new(tree: Arc<dyn DocumentTree>) -> Self {
        Self { tree: Some(tree) }
    }

    /// A provider waiting for a tree grant. Every operation fails with
    /// `BackendUnavailable` and [`StorageProvider::is_ready`] is false.
    pub fn unbound() -> Self {
        Self { tree: None }
    }

    async fn granted_root(&self) -> AppResult<(&dyn DocumentTree, DocumentInfo)> {
        let tree = self
            .tree
            .as_deref()
            .ok_or_else(|| AppError::backend_unavailable("No document tree has been granted"))?;
        let root = tree.root().await?.ok_or_else(|| {
            AppError::backend_unavailable("The document tree grant is not available")
        })?;
        Ok((tree, root))
    }

    /// Walk `logical` from the root. `None` as soon as a segment is missing.
    async fn find_doc(&self, logical: &str) -> AppResult<Option<DocumentInfo>> {
        let (tree, mut current) = self.granted_root().await?;
        for segment in path::segments(logical) {
            if !current.is_directory {
                return Ok(None);
            }
            match tree.find_child(&current.id, segment).await? {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    async fn require_doc(&self, logical: &str) -> AppResult<DocumentInfo> {
        self.find_doc(logical)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Not found: {logical}")))
    }

    async fn require_directory(&self, logical: &str) -> AppResult<DocumentInfo> {
        let doc = self.require_doc(logical).await?;
        if !doc.is_directory {
            return Err(AppError::invalid_path(format!("Not a directory: {logical}")));
        }
        Ok(doc)
    }

    fn tree(&self) -> AppResult<&dyn DocumentTree> {
        self.tree
            .as_deref()
            .ok_or_else(|| AppError::backend_unavailable("No document tree has been granted"))
    }

    /// Shared prologue of the create operations: the parent must exist and
    /// the name must be free.
    async fn prepare_create<'a>(
        &self,
        logical: &'a str,
    ) -> AppResult<(DocumentInfo, &'a str)> {
        if path::is_root(logical) {
            return Err(AppError::already_exists("The workspace root already exists"));
        }
        let (parent_logical, name) = path::split_parent(logical)?;
        let parent = self.require_directory(parent_logical).await?;
        if self.tree()?.find_child(&parent.id, name).await?.is_some() {
            return Err(AppError::already_exists(format!("Already exists: {logical}")));
        }
        Ok((parent, name))
    }
}

#[async_trait]
impl StorageProvider for DocumentTreeStorageProvider {
    fn provider_type(&self) -> &str {
        "document-tree"
    }

    async fn is_ready(&self) -> bool {
        match &self.tree {
            Some(tree) => matches!(tree.root().await, Ok(Some(_))),
            None => false,
        }
    }

    async fn list(&self, path: &str) -> AppResult<Vec<FileItem>> {
        let logical = path::normalize(path)?;
        let Some(dir) = self.find_doc(&logical).await? else {
            return Ok(Vec::new());
        };
        if !dir.is_directory {
            return Ok(Vec::new());
        }

        let children = self.tree()?.list_children(&dir.id).await?;
        let mut items: Vec<FileItem> = children
            .into_iter()
            .map(|doc| {
                let name = doc.name.unwrap_or_else(|| "unknown".to_string());
                FileItem {
                    path: path::join(&logical, &name),
                    name,
                    is_directory: doc.is_directory,
                    size: (!doc.is_directory).then_some(doc.size),
                    last_modified: doc.last_modified,
                }
            })
            .collect();
        sort_listing(&mut items);
        Ok(items)
    }

    async fn read_file(&self, path: &str) -> AppResult<String> {
        let logical = path::normalize(path)?;
        let doc = self.require_doc(&logical).await?;
        if doc.is_directory {
            return Err(AppError::invalid_path(format!("Is a directory: {logical}")));
        }

        let bytes = self.tree()?.read(&doc.id).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            AppError::with_source(
                ErrorKind::InvalidContent,
                format!("File is not valid UTF-8 text: {logical}"),
                e,
            )
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        let (parent_logical, name) = path::split_parent(&logical)?;
        let tree = self.tree()?;

        let doc = match self.find_doc(&logical).await? {
            Some(doc) if doc.is_directory => {
                return Err(AppError::invalid_path(format!("Is a directory: {logical}")));
            }
            Some(doc) => doc,
            None => {
                let parent = self.require_directory(parent_logical).await?;
                tree.create_file(&parent.id, mime_from_name(name), name)
                    .await?
            }
        };

        tree.write(&doc.id, Bytes::copy_from_slice(content.as_bytes()))
            .await?;
        debug!(path = %logical, bytes = content.len(), "Wrote document");
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        let (parent, name) = self.prepare_create(&logical).await?;
        self.tree()?.create_directory(&parent.id, name).await?;
        debug!(path = %logical, "Created document folder");
        Ok(())
    }

    async fn create_file(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        let (parent, name) = self.prepare_create(&logical).await?;
        self.tree()?
            .create_file(&parent.id, mime_from_name(name), name)
            .await?;
        debug!(path = %logical, "Created document");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        if path::is_root(&logical) {
            return Err(AppError::invalid_path("Refusing to delete the workspace root"));
        }
        let doc = self.require_doc(&logical).await?;
        self.tree()?.delete(&doc.id).await?;
        debug!(path = %logical, "Deleted document");
        Ok(())
    }

    async fn rename(&self, path: &str, new_name: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        path::validate_name(new_name)?;
        let (parent_logical, current_name) = path::split_parent(&logical)?;
        let doc = self.require_doc(&logical).await?;
        if current_name == new_name {
            return Ok(());
        }

        let target_logical = path::join(parent_logical, new_name);
        if self.find_doc(&target_logical).await?.is_some() {
            return Err(AppError::already_exists(format!(
                "Already exists: {target_logical}"
            )));
        }

        self.tree()?.rename(&doc.id, new_name).await?;
        debug!(from = %logical, to = %target_logical, "Renamed document");
        Ok(())
    }

    async fn absolute_path(&self, path: &str) -> AppResult<Option<PathBuf>> {
        let logical = path::normalize(path)?;
        let tree = self.tree()?;
        Ok(self
            .find_doc(&logical)
            .await?
            .and_then(|doc| tree.local_path(&doc.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryDocumentTree;

    fn provider() -> (MemoryDocumentTree, DocumentTreeStorageProvider) {
        let tree = MemoryDocumentTree::new();
        let provider = DocumentTreeStorageProvider::new(Arc::new(tree.clone()));
        (tree, provider)
    }

    #[tokio::test]
    async fn test_unbound_is_unavailable() {
        let provider = DocumentTreeStorageProvider::unbound();
        assert!(!provider.is_ready().await);
        let err = provider.list("/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendUnavailable);

        let ungranted = DocumentTreeStorageProvider::new(Arc::new(MemoryDocumentTree::unbound()));
        assert!(!ungranted.is_ready().await);
        let err = ungranted.read_file("/a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_write_creates_missing_file_only() {
        let (_tree, provider) = provider();
        provider.write_file("/a.txt", "one").await.unwrap();
        provider.write_file("/a.txt", "two").await.unwrap();
        assert_eq!(provider.read_file("/a.txt").await.unwrap(), "two");
        assert_eq!(provider.list("/").await.unwrap().len(), 1);

        let err = provider.write_file("/missing/a.txt", "x").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_requires_parent() {
        let (_tree, provider) = provider();
        let err = provider.create_folder("/a/b").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        provider.create_folder("/a").await.unwrap();
        provider.create_folder("/a/b").await.unwrap();
        let err = provider.create_file("/a/b").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_list_maps_and_sorts() {
        let (_tree, provider) = provider();
        provider.write_file("/b.txt", "bb").await.unwrap();
        provider.create_folder("/Z").await.unwrap();
        provider.write_file("/a.txt", "").await.unwrap();

        let items = provider.list("/").await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Z", "a.txt", "b.txt"]);
        assert_eq!(items[0].size, None);
        assert_eq!(items[2].size, Some(2));
        assert_eq!(items[2].path, "/b.txt");

        assert!(provider.list("/b.txt").await.unwrap().is_empty());
        assert!(provider.list("/nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_rename_errors() {
        let (tree, provider) = provider();
        provider.write_file("/a.sh", "x").await.unwrap();
        provider.write_file("/c.sh", "y").await.unwrap();

        let err = provider.rename("/a.sh", "c.sh").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        let err = provider.rename("/a.sh", "d/e.sh").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        let err = provider.delete("/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        let err = provider.delete("/zzz").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        provider.delete("/a.sh").await.unwrap();
        provider.delete("/c.sh").await.unwrap();
        assert!(tree.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_tree_has_no_host_path() {
        let (_tree, provider) = provider();
        provider.write_file("/a.sh", "x").await.unwrap();
        assert_eq!(provider.absolute_path("/a.sh").await.unwrap(), None);
    }
}
