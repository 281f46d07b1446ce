use std::fs;
use std::path::Path;

use tracing::debug;

use crate::backend::common::dtos::{FileNode, FileNodeKind, MutationOutcome};
use crate::backend::common::paths::{is_safe_dir_name, resolve_under};
use crate::error::{BackendError, BackendResult};

pub(crate) const MAX_TEXT_PREVIEW_BYTES: u64 = 1024 * 1024;

/// Lists a single directory level under the project root. Directories come
/// first, then files, each group sorted case-insensitively by name.
pub(crate) fn tree(project_root: &Path, relative: &str) -> BackendResult<Vec<FileNode>> {
    let dir = resolve_under(project_root, relative)?;
    let prefix = normalized_prefix(relative);

    let mut directories = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let node_path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let is_dir = entry.file_type()?.is_dir();
        let node = FileNode {
            path: node_path,
            name,
            kind: if is_dir {
                FileNodeKind::Directory
            } else {
                FileNodeKind::File
            },
            children: None,
        };
        if is_dir {
            directories.push(node);
        } else {
            files.push(node);
        }
    }
    directories.sort_by_key(|n| n.name.to_lowercase());
    files.sort_by_key(|n| n.name.to_lowercase());
    directories.extend(files);
    Ok(directories)
}

pub(crate) fn read_text(project_root: &Path, relative: &str) -> BackendResult<String> {
    let file = resolve_under(project_root, relative)?;
    let metadata = fs::metadata(&file)?;
    if metadata.len() > MAX_TEXT_PREVIEW_BYTES {
        return Err(BackendError::FileTooLarge(relative.to_string()));
    }
    Ok(fs::read_to_string(&file)?)
}

pub(crate) fn create_dir(project_root: &Path, relative: &str) -> BackendResult<MutationOutcome> {
    let target = resolve_under(project_root, relative)?;
    if let Some(name) = target.file_name().and_then(|n| n.to_str()) {
        if !is_safe_dir_name(name) {
            return Err(BackendError::InvalidName(name.to_string()));
        }
    }
    if target.exists() {
        return Ok(failure(format!("{relative} already exists")));
    }
    match fs::create_dir_all(&target) {
        Ok(()) => Ok(success(relative)),
        Err(e) => Ok(failure(format!("could not create {relative}: {e}"))),
    }
}

pub(crate) fn delete(project_root: &Path, relative: &str) -> BackendResult<MutationOutcome> {
    let target = resolve_under(project_root, relative)?;
    if target == project_root {
        return Err(BackendError::InvalidPath(
            "refusing to delete the project root".to_string(),
        ));
    }
    if !target.exists() {
        return Ok(failure(format!("{relative} does not exist")));
    }
    let result = if target.is_dir() {
        fs::remove_dir_all(&target)
    } else {
        fs::remove_file(&target)
    };
    debug!(path = %target.display(), ok = result.is_ok(), "delete");
    match result {
        Ok(()) => Ok(success(relative)),
        Err(e) => Ok(failure(format!("could not delete {relative}: {e}"))),
    }
}

pub(crate) fn rename(
    project_root: &Path,
    from: &str,
    to: &str,
) -> BackendResult<MutationOutcome> {
    let source = resolve_under(project_root, from)?;
    let destination = resolve_under(project_root, to)?;
    if let Some(name) = destination.file_name().and_then(|n| n.to_str()) {
        if !is_safe_dir_name(name) {
            return Err(BackendError::InvalidName(name.to_string()));
        }
    }
    if !source.exists() {
        return Ok(failure(format!("{from} does not exist")));
    }
    if destination.exists() {
        return Ok(failure(format!("{to} already exists")));
    }
    match fs::rename(&source, &destination) {
        Ok(()) => Ok(success(to)),
        Err(e) => Ok(failure(format!("could not rename {from}: {e}"))),
    }
}

fn normalized_prefix(relative: &str) -> String {
    relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn success(path: &str) -> MutationOutcome {
    MutationOutcome {
        ok: true,
        message: None,
        path: Some(path.to_string()),
    }
}

fn failure(message: String) -> MutationOutcome {
    MutationOutcome {
        ok: false,
        message: Some(message),
        path: None,
    }
}
