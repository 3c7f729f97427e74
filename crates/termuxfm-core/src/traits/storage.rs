//! Storage provider trait: the one façade every screen talks to.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Snapshot of one directory entry.
///
/// Created fresh by every [`StorageProvider::list`] call and never
/// mutated. Two listings of the same directory compare equal but share
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileItem {
    /// Leaf display name.
    pub name: String,
    /// Logical slash-rooted path, unique within a listing.
    pub path: String,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Size in bytes, files only.
    pub size: Option<u64>,
    /// Last modified timestamp, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Sort entries the way every listing is presented: directories first,
/// then by case-insensitive name.
pub fn sort_listing(items: &mut [FileItem]) {
    items.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Trait for workspace storage backends.
///
/// Implementations exist for a direct host directory and for a
/// document tree. Every path argument is a logical path (`/`, `/dir`,
/// `/dir/file.ext`); see [`crate::path`]. Exactly one provider is active
/// at a time and it is replaced wholesale when the workspace changes.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (`"direct"`, `"document-tree"`).
    fn provider_type(&self) -> &str;

    /// Whether the backend can serve requests.
    async fn is_ready(&self) -> bool;

    /// List the immediate children of a directory.
    ///
    /// A missing or non-directory target yields an empty listing.
    async fn list(&self, path: &str) -> AppResult<Vec<FileItem>>;

    /// Read the full content of a text file.
    async fn read_file(&self, path: &str) -> AppResult<String>;

    /// Replace the full content of a file, creating it when absent.
    async fn write_file(&self, path: &str, content: &str) -> AppResult<()>;

    /// Create a directory. Fails with `AlreadyExists` if the target exists.
    async fn create_folder(&self, path: &str) -> AppResult<()>;

    /// Create an empty file. Fails with `AlreadyExists` if the target exists.
    async fn create_file(&self, path: &str) -> AppResult<()>;

    /// Delete a file, or a directory with all its descendants.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Rename an entry within its parent directory.
    async fn rename(&self, path: &str, new_name: &str) -> AppResult<()>;

    /// Host filesystem path backing a logical path, if the backend has one.
    async fn absolute_path(&self, path: &str) -> AppResult<Option<PathBuf>>;
}
