//! Storage provider implementations.

pub mod direct;
pub mod document;
pub mod document_tree;

pub use direct::DirectStorageProvider;
pub use document::{DirectoryDocumentTree, MemoryDocumentTree, open_document_tree};
pub use document_tree::DocumentTreeStorageProvider;

/// Guess a MIME type from a file name extension.
///
/// Document providers use the MIME type to decide on an extension, so
/// unknown names get `application/octet-stream` to keep them verbatim.
pub fn mime_from_name(name: &str) -> &'static str {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return "application/octet-stream";
    };
    match ext.to_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "sh" | "bash" => "application/x-sh",
        "py" => "text/x-python",
        "js" => "application/javascript",
        "php" => "application/x-php",
        "rb" => "application/x-ruby",
        "pl" => "application/x-perl",
        "lua" => "text/x-lua",
        "json" => "application/json",
        "xml" => "application/xml",
        "toml" => "application/toml",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
