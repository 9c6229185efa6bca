//! Tree enumeration for the two pipelines.
//!
//! Archiving needs every directory below a root with descendants strictly
//! before their parents; restoring needs a fresh recursive scan for archive
//! files on every round, because extracting one archive can reveal new ones
//! nested inside it. The scan is therefore recomputed each round on purpose,
//! never pre-enumerated once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{OrganizerError, Result};

/// All directories strictly below `root`, each yielded after all of its
/// descendants. The root itself is excluded; the archive pipeline handles it
/// as the final step. The list is a snapshot taken before anything is
/// deleted.
pub fn dirs_bottom_up(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.map_err(into_io)?;
        if entry.file_type().is_dir() && entry.path() != root {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Fresh recursive enumeration of `*.{ext}` files under `root`.
pub fn scan_archives(root: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(into_io)?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |e| e == ext)
        {
            archives.push(entry.into_path());
        }
    }
    Ok(archives)
}

/// Partition a bottom-up directory list into depth levels, deepest first.
///
/// Directories within one level never contain one another, so they can be
/// archived concurrently; a parent always lands in a later group than its
/// children.
pub fn level_groups(dirs: &[PathBuf]) -> Vec<Vec<PathBuf>> {
    let mut by_depth: BTreeMap<usize, Vec<PathBuf>> = BTreeMap::new();
    for dir in dirs {
        by_depth
            .entry(dir.components().count())
            .or_default()
            .push(dir.clone());
    }
    by_depth.into_values().rev().collect()
}

fn into_io(err: walkdir::Error) -> OrganizerError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    OrganizerError::Io {
        source: err.into(),
        path,
    }
}
