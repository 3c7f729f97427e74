//! Logical path rules shared by every storage backend.
//!
//! A logical path is absolute, `/`-separated and case-preserving: `/`,
//! `/dir`, `/dir/file.ext`. Backends map it onto their own addressing
//! (host path or document lookups); this module only validates and splits.

use crate::error::AppError;
use crate::result::AppResult;

/// The workspace root.
pub const ROOT: &str = "/";

/// Normalize a logical path.
///
/// Adds the leading slash, collapses duplicate slashes and drops a trailing
/// slash. An empty input is the root. `.` and `..` segments are rejected
/// rather than resolved, so no path can leave the workspace root.
pub fn normalize(path: &str) -> AppResult<String> {
    if path.contains('\0') {
        return Err(AppError::invalid_path("Path contains a NUL byte"));
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(AppError::invalid_path(format!(
                "Relative segment '{segment}' is not allowed: {path}"
            )));
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Whether a normalized path designates the workspace root.
pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Split a normalized path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Parent of a normalized path. The root has no parent.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => Some(ROOT),
    }
}

/// Last segment of a normalized path. The root has no file name.
pub fn file_name(path: &str) -> Option<&str> {
    segments(path).last()
}

/// Join a normalized directory path and a single entry name.
pub fn join(dir: &str, name: &str) -> String {
    if is_root(dir) {
        format!("/{name}")
    } else {
        format!("{}/{name}", dir.trim_end_matches('/'))
    }
}

/// Split a normalized non-root path into `(parent, name)`.
pub fn split_parent(path: &str) -> AppResult<(&str, &str)> {
    match (parent(path), file_name(path)) {
        (Some(parent), Some(name)) => Ok((parent, name)),
        _ => Err(AppError::invalid_path(
            "The workspace root has no parent entry",
        )),
    }
}

/// Validate a single entry name, as used by `rename` and the create operations.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::invalid_path("Name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(AppError::invalid_path(format!("'{name}' is not a valid name")));
    }
    if name.contains('/') {
        return Err(AppError::invalid_path(format!(
            "Name must not contain '/': {name}"
        )));
    }
    if name.contains('\0') {
        return Err(AppError::invalid_path("Name contains a NUL byte"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_normalize_collapses_slashes() {
        assert_eq!(normalize("").unwrap(), "/");
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("//").unwrap(), "/");
        assert_eq!(normalize("Scripts").unwrap(), "/Scripts");
        assert_eq!(normalize("/Scripts//a.sh").unwrap(), "/Scripts/a.sh");
        assert_eq!(normalize("/Scripts/").unwrap(), "/Scripts");
        assert_eq!(normalize("/Mixed/Case.TXT").unwrap(), "/Mixed/Case.TXT");
    }

    #[test]
    fn test_normalize_rejects_traversal() {
        for bad in ["/..", "/a/../b", "./a", "/a/.", "a\0b"] {
            let err = normalize(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidPath, "{bad}");
        }
        // Dots inside a name are fine.
        assert_eq!(normalize("/.hidden/..x").unwrap(), "/.hidden/..x");
    }

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/a/b/c"), Some("/a/b"));
        assert_eq!(file_name("/"), None);
        assert_eq!(file_name("/a/b.sh"), Some("b.sh"));
        assert_eq!(split_parent("/a/b").unwrap(), ("/a", "b"));
        assert!(split_parent("/").is_err());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b"), "/a/b");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("b.sh").is_ok());
        assert!(validate_name("with space").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("sub/b.sh").is_err());
    }
}
