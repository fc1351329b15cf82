//! Virtual path helpers
//!
//! Virtual paths are slash-separated, relative (no leading slash) and never
//! contain empty, `.` or `..` segments. The root folder is the empty string.

use crate::error::{Error, Result};

/// File name used to keep an otherwise-empty folder alive
pub const PLACEHOLDER_NAME: &str = ".gitkeep";

/// Normalize a user-supplied file or folder path.
///
/// Leading and trailing slashes and surrounding whitespace are dropped.
/// Returns an empty string for the root (`""` or `"/"`).
pub fn normalize(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    for segment in trimmed.split('/') {
        let reason = if segment.is_empty() {
            Some("empty path segment")
        } else if segment == "." || segment == ".." {
            Some("relative segments are not allowed")
        } else if segment.contains('\\') {
            Some("backslashes are not allowed")
        } else if segment.trim() != segment {
            Some("segments may not start or end with whitespace")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(Error::invalid_path(path, reason));
        }
    }

    Ok(trimmed.to_string())
}

/// Normalize a path that must name an entry (not the root)
pub fn normalize_entry(path: &str) -> Result<String> {
    let normalized = normalize(path)?;
    if normalized.is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    Ok(normalized)
}

/// Join a folder and a name; the root folder is `""`
pub fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Parent folder of a path (`""` for root-level entries)
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a path
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Split a file name into `(stem, extension)`.
///
/// Dotfiles such as `.env` have no extension; only the last dot counts.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) if idx + 1 == name.len() => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

/// Lowercased extension of a path, if any
pub fn extension(path: &str) -> Option<String> {
    split_extension(file_name(path))
        .1
        .map(|ext| ext.to_ascii_lowercase())
}

/// Check whether `path` lies strictly inside `folder`
pub fn is_inside(path: &str, folder: &str) -> bool {
    if folder.is_empty() {
        return !path.is_empty();
    }
    path.len() > folder.len() + 1
        && path.starts_with(folder)
        && path.as_bytes()[folder.len()] == b'/'
}

/// Check whether `path` is `folder` itself or lies inside it
pub fn is_same_or_inside(path: &str, folder: &str) -> bool {
    path == folder || is_inside(path, folder)
}

/// Replace the `old_prefix` folder at the start of `path` with `new_prefix`.
///
/// Returns `None` when `path` is not inside `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_inside(path, old_prefix) {
        return None;
    }
    let rest = if old_prefix.is_empty() {
        path
    } else {
        &path[old_prefix.len() + 1..]
    };
    Some(join(new_prefix, rest))
}

/// All ancestor folders of a path, nearest last (root excluded)
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/').map(|(idx, _)| &path[..idx]).collect()
}

/// Check whether a path names a folder placeholder record
pub fn is_placeholder(path: &str) -> bool {
    file_name(path) == PLACEHOLDER_NAME
}

/// Placeholder record path for a folder
pub fn placeholder_for(folder: &str) -> String {
    join(folder, PLACEHOLDER_NAME)
}
