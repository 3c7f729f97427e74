//! Document tree implementations.
//!
//! Platform document providers are injected as `Arc<dyn DocumentTree>`;
//! this module ships an in-memory tree and one backed by a host directory.

pub mod directory;
pub mod memory;

use std::sync::Arc;

use url::Url;

use termuxfm_core::error::{AppError, ErrorKind};
use termuxfm_core::result::AppResult;
use termuxfm_core::traits::document::DocumentTree;

pub use directory::DirectoryDocumentTree;
pub use memory::MemoryDocumentTree;

/// Open the document tree a persisted tree URI points at.
///
/// Only `file://` URIs can be opened here. Any other scheme needs a
/// platform tree passed to
/// [`StorageManager::with_document_tree`](crate::StorageManager::with_document_tree).
pub fn open_document_tree(uri: &str) -> AppResult<Arc<dyn DocumentTree>> {
    let url = Url::parse(uri).map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Invalid tree URI: {uri}"),
            e,
        )
    })?;

    match url.scheme() {
        "file" => Ok(Arc::new(DirectoryDocumentTree::from_uri(uri)?)),
        scheme => Err(AppError::configuration(format!(
            "No document provider for '{scheme}' tree URIs; a platform provider must be injected"
        ))),
    }
}
