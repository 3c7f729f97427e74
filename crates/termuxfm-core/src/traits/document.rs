//! Document tree trait: a scoped, identifier-addressed directory tree.
//!
//! Document trees model a user-granted subtree of a document provider.
//! Nothing here knows about logical paths; the document-tree storage
//! backend walks children by name on top of this trait.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Opaque document identifier, stable for the lifetime of the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Document identifier.
    pub id: DocumentId,
    /// Display name. Providers may omit it.
    pub name: Option<String>,
    /// Whether the document is a directory.
    pub is_directory: bool,
    /// Content length in bytes (zero for directories).
    pub size: u64,
    /// Last modified timestamp.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A document provider tree.
///
/// Failures are final: callers do not retry, because access is governed
/// entirely by the grant the user made.
#[async_trait]
pub trait DocumentTree: Send + Sync + std::fmt::Debug + 'static {
    /// The tree root, or `None` when no grant is available.
    async fn root(&self) -> AppResult<Option<DocumentInfo>>;

    /// Find a direct child of `parent` by display name.
    async fn find_child(&self, parent: &DocumentId, name: &str)
    -> AppResult<Option<DocumentInfo>>;

    /// Enumerate the direct children of `parent`.
    async fn list_children(&self, parent: &DocumentId) -> AppResult<Vec<DocumentInfo>>;

    /// Create a child directory.
    async fn create_directory(&self, parent: &DocumentId, name: &str) -> AppResult<DocumentInfo>;

    /// Create an empty child document with the given MIME type.
    async fn create_file(
        &self,
        parent: &DocumentId,
        mime_type: &str,
        name: &str,
    ) -> AppResult<DocumentInfo>;

    /// Delete a document. Directories are deleted with their descendants.
    async fn delete(&self, id: &DocumentId) -> AppResult<()>;

    /// Rename a document in place. Returns the updated metadata, whose id
    /// may differ from the original.
    async fn rename(&self, id: &DocumentId, new_name: &str) -> AppResult<DocumentInfo>;

    /// Read the whole content of a document.
    async fn read(&self, id: &DocumentId) -> AppResult<Bytes>;

    /// Truncate a document and write `data` as its whole content.
    async fn write(&self, id: &DocumentId, data: Bytes) -> AppResult<()>;

    /// Host path backing a document, when the provider exposes one.
    fn local_path(&self, id: &DocumentId) -> Option<PathBuf>;
}
