//! Absolute path handling.
//!
//! A path is both a filesystem location and the key its value is stored
//! under, so every path is normalized before use: it must be absolute,
//! trailing slashes are dropped, and empty components are rejected.

use crate::FsError;

/// The root directory.
pub const ROOT: &str = "/";

/// A non-root path split into its parent directory and basename.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location<'a> {
    /// The normalized path, also the content key.
    pub path: &'a str,
    /// Key of the directory that lists this entry.
    pub parent: &'a str,
    /// The entry name within `parent`.
    pub name: &'a str,
}

/// Validate `path` and strip trailing slashes.
///
/// # Examples
///
/// ```rust
/// use donutfs::path::normalize;
///
/// assert_eq!(normalize("/a/b/").unwrap(), "/a/b");
/// assert_eq!(normalize("///").unwrap(), "/");
/// assert!(normalize("a/b").is_err());
/// assert!(normalize("/a//b").is_err());
/// ```
pub fn normalize(path: &str) -> Result<&str, FsError> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath {
            path: path.to_string(),
        });
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ROOT);
    }

    if trimmed[1..].split('/').any(str::is_empty) {
        return Err(FsError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(trimmed)
}

/// Split a path into parent and basename.
///
/// The root has no parent and is rejected with `InvalidPath`.
pub fn locate(path: &str) -> Result<Location<'_>, FsError> {
    let path = normalize(path)?;
    if path == ROOT {
        return Err(FsError::InvalidPath {
            path: path.to_string(),
        });
    }

    // normalize guarantees a leading '/' and a non-empty last component.
    let cut = path.rfind('/').unwrap_or(0);
    let parent = if cut == 0 { ROOT } else { &path[..cut] };
    Ok(Location {
        path,
        parent,
        name: &path[cut + 1..],
    })
}
