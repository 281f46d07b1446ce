use std::path::{Component, Path, PathBuf};

use crate::error::{BackendError, BackendResult};

/// Accepts a single directory-entry name: no separators, no traversal, only
/// alphanumerics plus `.`, `_`, `-`, and spaces, and not dot-only.
pub(crate) fn is_safe_dir_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 {
        return false;
    }
    if name == "." || name == ".." {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' || c == ' ')
}

/// Resolves a relative path under `root` without touching the filesystem.
/// Walks components lexically so `..` cannot climb above the root; absolute
/// paths, drive prefixes, and backslash separators are rejected outright.
pub(crate) fn resolve_under(root: &Path, relative: &str) -> BackendResult<PathBuf> {
    if relative.contains('\\') {
        return Err(BackendError::InvalidPath(format!(
            "backslash separators are not accepted: {relative}"
        )));
    }
    let candidate = Path::new(relative);
    let mut stack: Vec<std::ffi::OsString> = Vec::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => stack.push(part.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                if stack.pop().is_none() {
                    return Err(BackendError::PathOutsideProject(relative.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(BackendError::PathOutsideProject(relative.to_string()));
            }
        }
    }
    let mut resolved = root.to_path_buf();
    for part in stack {
        resolved.push(part);
    }
    Ok(resolved)
}

/// Default on-disk directory name for a project: lowercased, runs of
/// non-alphanumerics collapsed to single hyphens.
pub(crate) fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    let trimmed = slug.trim_end_matches('-').to_string();
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed
    }
}
