//! Expansion of directory-level require directives into per-file requires.

use std::path::{Path, PathBuf};

use crate::error::GraphError;

/// Files in `dir`, non-recursive, sorted by filename.
///
/// Used by `require_directory`: each returned file becomes one `require`.
/// The requiring file itself must be filtered out by the caller, which knows
/// its own path.
pub fn expand_directory(dir: &Path) -> Result<Vec<PathBuf>, GraphError> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        if entry.is_file() {
            files.push(entry);
        }
    }
    files.sort();
    Ok(files)
}

/// Files under `dir`, recursive, sorted by full path.
///
/// Used by `require_tree`. Directories sort among their siblings, so the
/// order is a stable depth-first listing.
pub fn expand_tree(dir: &Path) -> Result<Vec<PathBuf>, GraphError> {
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), GraphError> {
    for entry in read_dir(dir)? {
        if entry.is_dir() {
            walk(&entry, files)?;
        } else if entry.is_file() {
            files.push(entry);
        }
    }
    Ok(())
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, GraphError> {
    let read = std::fs::read_dir(dir).map_err(|e| GraphError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    Ok(read.filter_map(|entry| entry.ok()).map(|e| e.path()).collect())
}
