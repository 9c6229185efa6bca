//! Bottom-up compress-and-remove pipeline.
//!
//! Every directory below the root is replaced by a sibling archive, deepest
//! directories first, and the root itself is archived last. A directory is
//! deleted if and only if the tool reported its archive created; on any
//! compress failure the directory stays on disk and the run continues with
//! the remaining directories.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{OrganizerError, Result};
use crate::report::ReporterRegistry;
use crate::sevenzip::ArchiveTool;
use crate::walker;

#[derive(Clone, Debug)]
pub struct ArchiveOptions {
    /// Scan the intact tree and flush summary/error reports before any
    /// directory is removed.
    pub make_report: bool,
    /// Attach AiiDA UUIDs derived from the path structure to summary rows.
    pub aiida: bool,
    /// Worker threads for sibling directories within one depth level.
    /// 0 = auto-detect based on CPU cores.
    pub threads: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        ArchiveOptions {
            make_report: true,
            aiida: false,
            threads: 0,
        }
    }
}

/// Structured outcome of one archiving run. Per-directory failures never
/// abort the run; they are collected here and mapped to the exit code by
/// the caller.
#[derive(Debug, Default)]
pub struct ArchiveOutcome {
    /// Directories compressed and removed, in processing order.
    pub archived: Vec<PathBuf>,
    /// Empty directories that were skipped (nothing to preserve).
    pub skipped_empty: Vec<PathBuf>,
    /// Directories left intact because their compression failed.
    pub failed: Vec<(PathBuf, String)>,
}

impl ArchiveOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, result: DirResult) {
        match result {
            DirResult::Archived(dir) => self.archived.push(dir),
            DirResult::Skipped(dir) => self.skipped_empty.push(dir),
            DirResult::Failed(dir, why) => self.failed.push((dir, why)),
        }
    }
}

enum DirResult {
    Archived(PathBuf),
    Skipped(PathBuf),
    Failed(PathBuf, String),
}

/// Compress every directory under `root` into a sibling archive and remove
/// the original, then archive and remove `root` itself.
///
/// Directories are processed one depth level at a time, deepest first, so a
/// parent is only compressed once all of its children have been resolved
/// into archives. Siblings within a level are independent and run on a
/// bounded worker pool.
pub fn archive_and_remove(
    root: &Path,
    tool: &dyn ArchiveTool,
    opts: &ArchiveOptions,
) -> Result<ArchiveOutcome> {
    let root = root
        .canonicalize()
        .map_err(|e| OrganizerError::io(e, root))?;
    if !root.is_dir() {
        return Err(OrganizerError::NotADirectory { path: root });
    }

    if opts.make_report {
        let registry = ReporterRegistry::default();
        let acc = registry.scan_tree(&root, opts.aiida)?;
        registry.flush(&root, &acc)?;
    }

    // Snapshot before anything is deleted.
    let dirs = walker::dirs_bottom_up(&root)?;
    let levels = walker::level_groups(&dirs);
    info!(root = %root.display(), dirs = dirs.len(), levels = levels.len(), "archiving tree");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(opts.threads))
        .build()?;

    let mut outcome = ArchiveOutcome::default();
    pool.install(|| {
        for level in &levels {
            // Barrier between levels: a parent starts only after the whole
            // deeper level has finished.
            let results: Vec<DirResult> = level
                .par_iter()
                .map(|dir| archive_one(dir, tool))
                .collect();
            for result in results {
                outcome.record(result);
            }
        }
    });

    // The root is archived last, after all children are resolved.
    match compress_and_remove(&root, tool) {
        Ok(archive) => {
            info!(archive = %archive.display(), "root archived");
            outcome.archived.push(root);
        }
        Err(e) => {
            warn!(dir = %root.display(), error = %e, "failed to archive root");
            outcome.failed.push((root, e.to_string()));
        }
    }

    Ok(outcome)
}

fn archive_one(dir: &Path, tool: &dyn ArchiveTool) -> DirResult {
    match is_empty_dir(dir) {
        Ok(true) => {
            info!(dir = %dir.display(), "skipping empty directory");
            return DirResult::Skipped(dir.to_path_buf());
        }
        Ok(false) => {}
        Err(e) => return DirResult::Failed(dir.to_path_buf(), e.to_string()),
    }

    match compress_and_remove(dir, tool) {
        Ok(_) => DirResult::Archived(dir.to_path_buf()),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to archive");
            DirResult::Failed(dir.to_path_buf(), e.to_string())
        }
    }
}

/// Compress `dir` to its sibling archive, then delete it. The delete is
/// only reached after the tool reported success, which keeps each
/// directory's archive/delete pair atomic relative to its siblings.
fn compress_and_remove(dir: &Path, tool: &dyn ArchiveTool) -> Result<PathBuf> {
    let archive = sibling_archive_path(dir, tool.extension())?;
    tool.compress(dir, &archive)?;
    fs::remove_dir_all(dir).map_err(|e| OrganizerError::io(e, dir))?;
    info!(dir = %dir.display(), archive = %archive.display(), "archived and removed");
    Ok(archive)
}

/// `<parent>/<dirname>.<ext>`, next to the directory it replaces.
pub fn sibling_archive_path(dir: &Path, ext: &str) -> Result<PathBuf> {
    let parent = dir.parent().ok_or_else(|| OrganizerError::InvalidPath {
        path: dir.to_path_buf(),
    })?;
    let name = dir.file_name().ok_or_else(|| OrganizerError::InvalidPath {
        path: dir.to_path_buf(),
    })?;
    let mut file = name.to_os_string();
    file.push(".");
    file.push(ext);
    Ok(parent.join(file))
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir).map_err(|e| OrganizerError::io(e, dir))?;
    Ok(entries.next().is_none())
}

pub(crate) fn worker_count(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}
