//! Direct filesystem storage provider.
//!
//! Serves the workspace from a host directory. Any operation that fails
//! with a permission error gets exactly one repair attempt through the
//! [`RepairHelper`] and is retried once if the repair restored access.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use tokio::fs;
use tracing::debug;

use termuxfm_core::error::{AppError, ErrorKind};
use termuxfm_core::path;
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::storage::{FileItem, StorageProvider, sort_listing};

use crate::repair::{Access, RepairHelper};

/// Direct filesystem storage provider.
#[derive(Debug, Clone)]
pub struct DirectStorageProvider {
    /// Workspace root on the host.
    root: PathBuf,
    /// Permission repair used on access failures.
    repair: RepairHelper,
}

impl DirectStorageProvider {
    /// Create a provider rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: impl Into<PathBuf>, repair: RepairHelper) -> AppResult<Self> {
        let root = root_path.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::from_io(
                e,
                format!("Failed to create workspace root: {}", root.display()),
            )
        })?;
        Ok(Self { root, repair })
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path to a host path within the root.
    pub fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let logical = path::normalize(path)?;
        Ok(self.host_path(&logical))
    }

    fn host_path(&self, logical: &str) -> PathBuf {
        if path::is_root(logical) {
            self.root.clone()
        } else {
            self.root.join(logical.trim_start_matches('/'))
        }
    }

    /// Run `op`; on a permission error repair `target` once and retry.
    async fn with_repair<T, F, Fut>(
        &self,
        target: &Path,
        is_directory: bool,
        access: Access,
        op: F,
    ) -> io::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = io::Result<T>>,
    {
        match op().await {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                if self.repair.ensure(target, is_directory, access).await {
                    op().await
                } else {
                    Err(e)
                }
            }
            other => other,
        }
    }

    /// Make sure `dir` exists as a directory, creating missing levels.
    async fn ensure_dir(&self, dir: &Path, logical: &str) -> AppResult<()> {
        match fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(AppError::invalid_path(format!(
                    "Not a directory: {logical}"
                )));
            }
            Err(_) => {}
        }

        let anchor = self.nearest_existing_ancestor(dir).await;
        self.with_repair(&anchor, true, Access::Write, move || fs::create_dir_all(dir))
            .await
            .map_err(|e| io_failure(e, "create directory", logical))
    }

    async fn nearest_existing_ancestor(&self, dir: &Path) -> PathBuf {
        for ancestor in dir.ancestors() {
            if fs::metadata(ancestor).await.is_ok() {
                return ancestor.to_path_buf();
            }
        }
        self.root.clone()
    }

    /// Depth-first delete; stops at the first failure that survives a repair.
    fn delete_tree(&self, full: PathBuf, logical: String) -> BoxFuture<'_, AppResult<()>> {
        async move {
            let meta = fs::symlink_metadata(&full)
                .await
                .map_err(|e| io_failure(e, "delete", &logical))?;
            let is_directory = meta.is_dir();

            if is_directory {
                let dir = full.as_path();
                let names = self
                    .with_repair(dir, true, Access::ReadWrite, move || read_names(dir))
                    .await
                    .map_err(|e| io_failure(e, "delete", &logical))?;
                for name in names {
                    let child_logical = path::join(&logical, &name);
                    self.delete_tree(full.join(&name), child_logical).await?;
                }
            }

            let parent = full.parent().unwrap_or(self.root.as_path());
            let target = full.as_path();
            self.with_repair(parent, true, Access::Write, move || async move {
                if is_directory {
                    fs::remove_dir(target).await
                } else {
                    fs::remove_file(target).await
                }
            })
            .await
            .map_err(|e| io_failure(e, "delete", &logical))
        }
        .boxed()
    }
}

#[async_trait]
impl StorageProvider for DirectStorageProvider {
    fn provider_type(&self) -> &str {
        "direct"
    }

    async fn is_ready(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn list(&self, path: &str) -> AppResult<Vec<FileItem>> {
        let logical = path::normalize(path)?;
        let dir = self.host_path(&logical);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Ok(Vec::new()),
        }

        let dir_ref = dir.as_path();
        let entries = match self
            .with_repair(dir_ref, true, Access::Read, move || read_entries(dir_ref))
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %logical, "Directory still unreadable after repair, listing nothing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_failure(e, "list directory", &logical)),
        };

        let mut items: Vec<FileItem> = entries
            .into_iter()
            .map(|(name, meta)| FileItem {
                path: path::join(&logical, &name),
                name,
                is_directory: meta.is_dir(),
                size: meta.is_file().then(|| meta.len()),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            })
            .collect();
        sort_listing(&mut items);
        Ok(items)
    }

    async fn read_file(&self, path: &str) -> AppResult<String> {
        let logical = path::normalize(path)?;
        let full = self.host_path(&logical);
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| io_failure(e, "read file", &logical))?;
        if meta.is_dir() {
            return Err(AppError::invalid_path(format!("Is a directory: {logical}")));
        }

        let file = full.as_path();
        let bytes = self
            .with_repair(file, false, Access::Read, move || fs::read(file))
            .await
            .map_err(|e| io_failure(e, "read file", &logical))?;

        String::from_utf8(bytes).map_err(|e| {
            AppError::with_source(
                ErrorKind::InvalidContent,
                format!("File is not valid UTF-8 text: {logical}"),
                e,
            )
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        let (parent_logical, _) = path::split_parent(&logical)?;
        let full = self.host_path(&logical);
        let parent = self.host_path(parent_logical);
        self.ensure_dir(&parent, parent_logical).await?;

        let existing = fs::metadata(&full).await.ok();
        if existing.as_ref().is_some_and(|m| m.is_dir()) {
            return Err(AppError::invalid_path(format!("Is a directory: {logical}")));
        }

        // Overwriting needs a writable file; creating needs a writable parent.
        let (target, is_directory) = match existing {
            Some(_) => (full.as_path(), false),
            None => (parent.as_path(), true),
        };
        let file = full.as_path();
        self.with_repair(target, is_directory, Access::Write, move || {
            fs::write(file, content.as_bytes())
        })
        .await
        .map_err(|e| io_failure(e, "write file", &logical))?;

        debug!(path = %logical, bytes = content.len(), "Wrote file");
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        if path::is_root(&logical) {
            return Err(AppError::already_exists("The workspace root already exists"));
        }
        let (parent_logical, _) = path::split_parent(&logical)?;
        let full = self.host_path(&logical);
        if fs::symlink_metadata(&full).await.is_ok() {
            return Err(AppError::already_exists(format!("Already exists: {logical}")));
        }

        let parent = self.host_path(parent_logical);
        self.ensure_dir(&parent, parent_logical).await?;
        let dir = full.as_path();
        self.with_repair(&parent, true, Access::Write, move || fs::create_dir(dir))
            .await
            .map_err(|e| io_failure(e, "create folder", &logical))?;

        debug!(path = %logical, "Created folder");
        Ok(())
    }

    async fn create_file(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        if path::is_root(&logical) {
            return Err(AppError::already_exists("The workspace root already exists"));
        }
        let (parent_logical, _) = path::split_parent(&logical)?;
        let full = self.host_path(&logical);
        if fs::symlink_metadata(&full).await.is_ok() {
            return Err(AppError::already_exists(format!("Already exists: {logical}")));
        }

        let parent = self.host_path(parent_logical);
        self.ensure_dir(&parent, parent_logical).await?;
        let file = full.as_path();
        self.with_repair(&parent, true, Access::Write, move || async move {
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(file)
                .await
                .map(drop)
        })
        .await
        .map_err(|e| io_failure(e, "create file", &logical))?;

        debug!(path = %logical, "Created file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        if path::is_root(&logical) {
            return Err(AppError::invalid_path("Refusing to delete the workspace root"));
        }

        let full = self.host_path(&logical);
        self.delete_tree(full, logical.clone()).await?;
        debug!(path = %logical, "Deleted");
        Ok(())
    }

    async fn rename(&self, path: &str, new_name: &str) -> AppResult<()> {
        let logical = path::normalize(path)?;
        path::validate_name(new_name)?;
        let (parent_logical, current_name) = path::split_parent(&logical)?;

        let from = self.host_path(&logical);
        let from_meta = fs::symlink_metadata(&from)
            .await
            .map_err(|e| io_failure(e, "rename", &logical))?;
        if current_name == new_name {
            return Ok(());
        }

        let parent = self.host_path(parent_logical);
        let to = parent.join(new_name);
        let target_logical = path::join(parent_logical, new_name);
        if let Ok(to_meta) = fs::symlink_metadata(&to).await {
            // A case-only rename on a case-insensitive volume sees itself.
            if !same_entry(&from_meta, &to_meta) {
                return Err(AppError::already_exists(format!(
                    "Already exists: {target_logical}"
                )));
            }
        }

        let (from_ref, to_ref) = (from.as_path(), to.as_path());
        self.with_repair(&parent, true, Access::Write, move || {
            fs::rename(from_ref, to_ref)
        })
        .await
        .map_err(|e| io_failure(e, "rename", &logical))?;

        debug!(from = %logical, to = %target_logical, "Renamed");
        Ok(())
    }

    async fn absolute_path(&self, path: &str) -> AppResult<Option<PathBuf>> {
        self.resolve(path).map(Some)
    }
}

/// Map an I/O failure to an [`AppError`] with a message naming the logical path.
fn io_failure(err: io::Error, action: &str, logical: &str) -> AppError {
    let message = match err.kind() {
        io::ErrorKind::NotFound => format!("Not found: {logical}"),
        io::ErrorKind::PermissionDenied => format!("Permission denied: {logical}"),
        io::ErrorKind::AlreadyExists => format!("Already exists: {logical}"),
        _ => format!("Failed to {action}: {logical}"),
    };
    AppError::from_io(err, message)
}

async fn read_entries(dir: &Path) -> io::Result<Vec<(String, std::fs::Metadata)>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        // Follow symlinks, but still list dangling ones.
        let meta = match fs::metadata(entry.path()).await {
            Ok(meta) => meta,
            Err(_) => entry.metadata().await?,
        };
        entries.push((entry.file_name().to_string_lossy().into_owned(), meta));
    }
    Ok(entries)
}

async fn read_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut reader = fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

#[cfg(unix)]
fn same_entry(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_entry(_a: &std::fs::Metadata, _b: &std::fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn provider() -> (tempfile::TempDir, DirectStorageProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectStorageProvider::new(dir.path().join("ws"), RepairHelper::disabled())
            .await
            .unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_resolve_joins_root() {
        let (_dir, provider) = provider().await;
        let root = provider.root().to_path_buf();
        assert_eq!(provider.resolve("/").unwrap(), root);
        assert_eq!(provider.resolve("").unwrap(), root);
        assert_eq!(provider.resolve("//a//b.sh").unwrap(), root.join("a/b.sh"));
        assert_eq!(
            provider.resolve("/a/b.sh").unwrap(),
            provider.resolve("/a/b.sh").unwrap()
        );
        assert!(provider.resolve("/a/../../etc").is_err());
    }

    #[tokio::test]
    async fn test_list_sorted_with_sizes() {
        let (_dir, provider) = provider().await;
        assert!(provider.list("/").await.unwrap().is_empty());

        provider.write_file("/b.txt", "bb").await.unwrap();
        provider.write_file("/A.txt", "a").await.unwrap();
        provider.create_folder("/zdir").await.unwrap();

        let items = provider.list("/").await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["zdir", "A.txt", "b.txt"]);
        assert_eq!(items[0].size, None);
        assert_eq!(items[2].size, Some(2));
        assert_eq!(items[2].path, "/b.txt");
        assert!(items[2].last_modified.is_some());
    }

    #[tokio::test]
    async fn test_list_of_missing_or_file_is_empty() {
        let (_dir, provider) = provider().await;
        provider.write_file("/f.txt", "x").await.unwrap();
        assert!(provider.list("/missing").await.unwrap().is_empty());
        assert!(provider.list("/f.txt").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let (_dir, provider) = provider().await;
        provider.write_file("/deep/er/x.txt", "hi").await.unwrap();
        assert_eq!(provider.read_file("/deep/er/x.txt").await.unwrap(), "hi");
        assert!(provider.list("/deep").await.unwrap()[0].is_directory);
    }

    #[tokio::test]
    async fn test_create_existing_is_already_exists() {
        let (_dir, provider) = provider().await;
        provider.create_folder("/Scripts").await.unwrap();
        provider.create_file("/Scripts/a.sh").await.unwrap();

        let err = provider.create_folder("/Scripts").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        let err = provider.create_file("/Scripts/a.sh").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        let err = provider.create_folder("/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_read_errors() {
        let (_dir, provider) = provider().await;
        let err = provider.read_file("/nope.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        std::fs::write(provider.root().join("bin.dat"), [0xff, 0xfe, 0x00]).unwrap();
        let err = provider.read_file("/bin.dat").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidContent);

        provider.create_folder("/d").await.unwrap();
        let err = provider.read_file("/d").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
    }

    #[tokio::test]
    async fn test_rename_rules() {
        let (_dir, provider) = provider().await;
        provider.write_file("/a.sh", "x").await.unwrap();
        provider.write_file("/c.sh", "y").await.unwrap();

        let err = provider.rename("/a.sh", "sub/b.sh").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        let err = provider.rename("/a.sh", "c.sh").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        let err = provider.rename("/missing", "m").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        provider.rename("/a.sh", "b.sh").await.unwrap();
        assert_eq!(provider.read_file("/b.sh").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_delete_recursive_and_missing() {
        let (_dir, provider) = provider().await;
        provider.write_file("/d/e/f.txt", "x").await.unwrap();
        provider.write_file("/d/g.txt", "y").await.unwrap();

        provider.delete("/d").await.unwrap();
        assert!(provider.list("/").await.unwrap().is_empty());

        let err = provider.delete("/d").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = provider.delete("/").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
    }

    #[tokio::test]
    async fn test_is_ready_tracks_root() {
        let (_dir, provider) = provider().await;
        assert!(provider.is_ready().await);
        std::fs::remove_dir_all(provider.root()).unwrap();
        assert!(!provider.is_ready().await);
    }
}
