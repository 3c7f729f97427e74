//! Document tree over a host directory, opened from a `file://` tree URI.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use url::Url;

use termuxfm_core::error::{AppError, ErrorKind};
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::document::{DocumentId, DocumentInfo, DocumentTree};

/// A document tree whose documents are entries below a host directory.
///
/// Document IDs are paths relative to the tree root (`""` for the root
/// itself), so they change on rename just like provider-issued IDs may.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentTree {
    root: PathBuf,
}

impl DirectoryDocumentTree {
    /// Create a tree rooted at `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a tree from a `file://` URI.
    pub fn from_uri(uri: &str) -> AppResult<Self> {
        let url = Url::parse(uri).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid tree URI: {uri}"),
                e,
            )
        })?;
        if url.scheme() != "file" {
            return Err(AppError::configuration(format!(
                "Not a file tree URI: {uri}"
            )));
        }
        let root = url
            .to_file_path()
            .map_err(|_| AppError::configuration(format!("Tree URI has no local path: {uri}")))?;
        Ok(Self::new(root))
    }

    /// The host directory backing the tree.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &DocumentId) -> AppResult<PathBuf> {
        let relative = Path::new(id.as_str());
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(AppError::invalid_path(format!("Foreign document id: {id}")));
        }
        Ok(self.root.join(relative))
    }

    fn child_id(parent: &DocumentId, name: &str) -> DocumentId {
        if parent.as_str().is_empty() {
            DocumentId::new(name)
        } else {
            DocumentId::new(format!("{}/{name}", parent.as_str()))
        }
    }

    async fn describe(&self, id: DocumentId) -> io::Result<DocumentInfo> {
        let full = self.root.join(id.as_str());
        let meta = fs::metadata(&full).await?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(DocumentInfo {
            id,
            name,
            is_directory: meta.is_dir(),
            size: if meta.is_file() { meta.len() } else { 0 },
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

fn io_error(err: io::Error, action: &str, id: &DocumentId) -> AppError {
    AppError::from_io(err, format!("Failed to {action} document '{id}'"))
}

#[async_trait]
impl DocumentTree for DirectoryDocumentTree {
    async fn root(&self) -> AppResult<Option<DocumentInfo>> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => {
                let mut info = self
                    .describe(DocumentId::new(""))
                    .await
                    .map_err(|e| io_error(e, "describe", &DocumentId::new("")))?;
                info.name = self
                    .root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                Ok(Some(info))
            }
            _ => Ok(None),
        }
    }

    async fn find_child(
        &self,
        parent: &DocumentId,
        name: &str,
    ) -> AppResult<Option<DocumentInfo>> {
        self.path_of(parent)?;
        let id = Self::child_id(parent, name);
        self.path_of(&id)?;
        match self.describe(id.clone()).await {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e, "find", &id)),
        }
    }

    async fn list_children(&self, parent: &DocumentId) -> AppResult<Vec<DocumentInfo>> {
        let dir = self.path_of(parent)?;
        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(e, "list", parent))?;

        let mut children = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_error(e, "list", parent))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let id = Self::child_id(parent, &name);
            match self.describe(id.clone()).await {
                Ok(info) => children.push(info),
                // Dangling symlinks are not documents.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e, "describe", &id)),
            }
        }
        Ok(children)
    }

    async fn create_directory(&self, parent: &DocumentId, name: &str) -> AppResult<DocumentInfo> {
        let id = Self::child_id(parent, name);
        let full = self.path_of(&id)?;
        fs::create_dir(&full)
            .await
            .map_err(|e| io_error(e, "create", &id))?;
        self.describe(id.clone())
            .await
            .map_err(|e| io_error(e, "describe", &id))
    }

    async fn create_file(
        &self,
        parent: &DocumentId,
        _mime_type: &str,
        name: &str,
    ) -> AppResult<DocumentInfo> {
        let id = Self::child_id(parent, name);
        let full = self.path_of(&id)?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| io_error(e, "create", &id))?;
        self.describe(id.clone())
            .await
            .map_err(|e| io_error(e, "describe", &id))
    }

    async fn delete(&self, id: &DocumentId) -> AppResult<()> {
        if id.as_str().is_empty() {
            return Err(AppError::invalid_path("The tree root cannot be deleted"));
        }
        let full = self.path_of(id)?;
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| io_error(e, "delete", id))?;
        if meta.is_dir() {
            fs::remove_dir_all(&full).await
        } else {
            fs::remove_file(&full).await
        }
        .map_err(|e| io_error(e, "delete", id))
    }

    async fn rename(&self, id: &DocumentId, new_name: &str) -> AppResult<DocumentInfo> {
        if id.as_str().is_empty() {
            return Err(AppError::invalid_path("The tree root cannot be renamed"));
        }
        let from = self.path_of(id)?;
        let parent = match id.as_str().rsplit_once('/') {
            Some((parent, _)) => DocumentId::new(parent),
            None => DocumentId::new(""),
        };
        let new_id = Self::child_id(&parent, new_name);
        let to = self.path_of(&new_id)?;
        if fs::symlink_metadata(&to).await.is_ok() {
            return Err(AppError::already_exists(format!(
                "A document named '{new_name}' already exists"
            )));
        }
        fs::rename(&from, &to)
            .await
            .map_err(|e| io_error(e, "rename", id))?;
        self.describe(new_id.clone())
            .await
            .map_err(|e| io_error(e, "describe", &new_id))
    }

    async fn read(&self, id: &DocumentId) -> AppResult<Bytes> {
        let full = self.path_of(id)?;
        fs::read(&full)
            .await
            .map(Bytes::from)
            .map_err(|e| io_error(e, "read", id))
    }

    async fn write(&self, id: &DocumentId, data: Bytes) -> AppResult<()> {
        let full = self.path_of(id)?;
        fs::write(&full, &data)
            .await
            .map_err(|e| io_error(e, "write", id))
    }

    fn local_path(&self, id: &DocumentId) -> Option<PathBuf> {
        self.path_of(id).ok()
    }
}
