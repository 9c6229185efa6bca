//! Iterative fixed-point restore of nested archives.
//!
//! The working root is re-scanned after every extraction round because
//! unpacking one archive can reveal new archives nested inside it; a single
//! upfront enumeration would miss them. An archive file is deleted only
//! after its extraction succeeded; a failing archive stays on disk, is
//! reported once and is never retried within the same run, which is what
//! guarantees termination even when no round makes net progress.
//!
//! Asymmetry with the archive pipeline, by inheritance from the original
//! workflow: empty directories that were skipped during archiving are not
//! guaranteed to be recreated on restore.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::archive::worker_count;
use crate::error::{OrganizerError, Result};
use crate::report::ReporterRegistry;
use crate::sevenzip::ArchiveTool;
use crate::walker;

#[derive(Clone, Debug)]
pub struct RestoreOptions {
    /// Scan the fully restored tree once and flush summary/error reports.
    pub make_report: bool,
    /// Attach AiiDA UUIDs derived from the path structure to summary rows.
    pub aiida: bool,
    /// Worker threads for distinct archives within one round.
    /// 0 = auto-detect based on CPU cores.
    pub threads: usize,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        RestoreOptions {
            make_report: true,
            aiida: false,
            threads: 0,
        }
    }
}

/// Structured outcome of one restore run.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    /// The working root holding the restored tree.
    pub root: PathBuf,
    /// Number of scan/extract rounds until the fixed point.
    pub rounds: usize,
    /// Archives extracted and deleted.
    pub extracted: Vec<PathBuf>,
    /// Archives left on disk because their extraction failed.
    pub failed: Vec<(PathBuf, String)>,
}

impl RestoreOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Restore `path`, which is either a single archive file or a directory
/// possibly containing nested archives, until a scan finds no archives
/// left.
///
/// Only a failure on the top-level root archive is fatal; any other failing
/// archive is recorded and the run continues.
pub fn restore(path: &Path, tool: &dyn ArchiveTool, opts: &RestoreOptions) -> Result<RestoreOutcome> {
    let ext = tool.extension();
    let mut outcome = RestoreOutcome::default();

    let root = if path.is_file() && path.extension().map_or(false, |e| e == ext) {
        let root = extract_root_archive(path, tool)?;
        outcome.extracted.push(path.to_path_buf());
        root
    } else if path.is_dir() {
        path.to_path_buf()
    } else {
        return Err(OrganizerError::NotADirectory {
            path: path.to_path_buf(),
        });
    };
    outcome.root = root.clone();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(opts.threads))
        .build()?;

    let mut known_bad: HashSet<PathBuf> = HashSet::new();
    loop {
        // Recomputed fresh every round: extraction reveals nested archives.
        let pending: Vec<PathBuf> = walker::scan_archives(&root, ext)?
            .into_iter()
            .filter(|a| !known_bad.contains(a))
            .collect();
        if pending.is_empty() {
            break;
        }

        outcome.rounds += 1;
        debug!(round = outcome.rounds, archives = pending.len(), "extraction round");

        // Barrier: the next scan starts only after the whole round is done.
        let results: Vec<(PathBuf, Result<()>)> = pool.install(|| {
            pending
                .par_iter()
                .map(|archive| (archive.clone(), extract_one(archive, tool)))
                .collect()
        });

        for (archive, result) in results {
            match result {
                Ok(()) => outcome.extracted.push(archive),
                Err(e) => {
                    warn!(archive = %archive.display(), error = %e, "failed to extract, leaving in place");
                    known_bad.insert(archive.clone());
                    outcome.failed.push((archive, e.to_string()));
                }
            }
        }
    }

    info!(
        root = %root.display(),
        rounds = outcome.rounds,
        extracted = outcome.extracted.len(),
        failed = outcome.failed.len(),
        "restore reached fixed point"
    );

    if opts.make_report {
        let registry = ReporterRegistry::default();
        let acc = registry.scan_tree(&root, opts.aiida)?;
        registry.flush(&root, &acc)?;
    }

    Ok(outcome)
}

/// Extract the top-level archive into its parent directory and return the
/// directory it produced. A failure here is fatal: without the root there
/// is no tree to walk.
fn extract_root_archive(archive: &Path, tool: &dyn ArchiveTool) -> Result<PathBuf> {
    info!(archive = %archive.display(), "extracting root archive");
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    tool.extract(archive, parent)?;

    let stem = archive
        .file_stem()
        .ok_or_else(|| OrganizerError::InvalidPath {
            path: archive.to_path_buf(),
        })?;
    let root = parent.join(stem);
    if !root.is_dir() {
        // The tool claimed success but the expected directory is absent.
        return Err(OrganizerError::MissingExtractedDir { path: root });
    }

    fs::remove_file(archive).map_err(|e| OrganizerError::io(e, archive))?;
    Ok(root)
}

/// Extract one nested archive into its own containing directory, deleting
/// it only after the tool reported success.
fn extract_one(archive: &Path, tool: &dyn ArchiveTool) -> Result<()> {
    let target = archive.parent().unwrap_or_else(|| Path::new("."));
    tool.extract(archive, target)?;
    fs::remove_file(archive).map_err(|e| OrganizerError::io(e, archive))?;
    debug!(archive = %archive.display(), "extracted and removed");
    Ok(())
}
