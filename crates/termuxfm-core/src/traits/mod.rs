//! Core traits defined in `termuxfm-core` and implemented by `termuxfm-storage`.

pub mod document;
pub mod repair;
pub mod storage;

pub use document::{DocumentId, DocumentInfo, DocumentTree};
pub use repair::PermissionRepair;
pub use storage::{FileItem, StorageProvider};
