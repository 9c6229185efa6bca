//! Shared helpers for the pipeline integration tests: a tar-backed
//! [`ArchiveTool`] so the tests run without a `7z` binary, plus wrappers
//! for fault injection and call recording.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dft_organizer::error::{OrganizerError, Result};
use dft_organizer::sevenzip::ArchiveTool;

fn io_err(e: std::io::Error, path: &Path) -> OrganizerError {
    OrganizerError::Io {
        source: e,
        path: path.to_path_buf(),
    }
}

/// Mirrors the `7z` adapter's contract with `tar`: the archive stores the
/// directory under its bare name, extraction unpacks into the target
/// directory, and neither side deletes anything.
pub struct TarTool;

impl ArchiveTool for TarTool {
    fn compress(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        let file = File::create(archive_path).map_err(|e| io_err(e, archive_path))?;
        let mut builder = tar::Builder::new(file);
        let name = source_dir.file_name().expect("source dir has a name");
        builder
            .append_dir_all(name, source_dir)
            .map_err(|e| io_err(e, source_dir))?;
        builder.finish().map_err(|e| io_err(e, archive_path))?;
        Ok(())
    }

    fn extract(&self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        let file = File::open(archive_path).map_err(|e| io_err(e, archive_path))?;
        tar::Archive::new(file)
            .unpack(target_dir)
            .map_err(|e| io_err(e, archive_path))?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "tar"
    }
}

/// Fails any operation whose subject's file name is in the deny list,
/// without creating or touching anything.
pub struct FlakyTool {
    inner: TarTool,
    deny: Vec<String>,
}

impl FlakyTool {
    pub fn denying(names: &[&str]) -> Self {
        FlakyTool {
            inner: TarTool,
            deny: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn denied(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| self.deny.iter().any(|d| n == d.as_str()))
            .unwrap_or(false)
    }

    fn injected(&self, path: &Path) -> OrganizerError {
        OrganizerError::ToolFailed {
            program: "flaky-tar".into(),
            path: path.to_path_buf(),
            code: Some(2),
            stderr: "injected failure".into(),
        }
    }
}

impl ArchiveTool for FlakyTool {
    fn compress(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        if self.denied(source_dir) {
            return Err(self.injected(source_dir));
        }
        self.inner.compress(source_dir, archive_path)
    }

    fn extract(&self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        if self.denied(archive_path) {
            return Err(self.injected(archive_path));
        }
        self.inner.extract(archive_path, target_dir)
    }

    fn extension(&self) -> &str {
        self.inner.extension()
    }
}

/// Records every directory handed to `compress`.
pub struct RecordingTool {
    inner: TarTool,
    pub compressed: Mutex<Vec<PathBuf>>,
}

impl RecordingTool {
    pub fn new() -> Self {
        RecordingTool {
            inner: TarTool,
            compressed: Mutex::new(Vec::new()),
        }
    }
}

impl ArchiveTool for RecordingTool {
    fn compress(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        self.compressed
            .lock()
            .unwrap()
            .push(source_dir.to_path_buf());
        self.inner.compress(source_dir, archive_path)
    }

    fn extract(&self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        self.inner.extract(archive_path, target_dir)
    }

    fn extension(&self) -> &str {
        self.inner.extension()
    }
}

/// Reference tree used across the pipeline tests:
/// `R/A/x`, `R/B` (empty) and `R/C/D/y`.
pub fn build_scenario(parent: &Path) -> PathBuf {
    let root = parent.join("R");
    fs::create_dir_all(root.join("A")).unwrap();
    fs::create_dir_all(root.join("B")).unwrap();
    fs::create_dir_all(root.join("C/D")).unwrap();
    fs::write(root.join("A/x"), b"alpha contents").unwrap();
    fs::write(root.join("C/D/y"), b"delta contents").unwrap();
    root
}
