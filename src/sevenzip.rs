//! Thin adapter around the external `7z` binary.
//!
//! The pipelines never compress or extract anything themselves; they go
//! through the [`ArchiveTool`] trait, whose production implementation is
//! [`SevenZip`]. The tool only creates archives and populates directories.
//! Deleting the source directory (after a verified compress) or the archive
//! file (after a verified extract) is always the caller's responsibility.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{OrganizerError, Result};

/// How often a running child process is polled for exit/cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Shared flag for aborting a stuck tool invocation from another thread.
///
/// Cancellation is checked between polls of the child process; on cancel the
/// child is killed and the directory or archive in flight is left untouched.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// External compressor/decompressor boundary used by both pipelines.
///
/// Implementations must be safe to call from multiple worker threads at
/// once; each call operates on distinct paths.
pub trait ArchiveTool: Sync {
    /// Create `archive_path` from the contents of `source_dir`.
    ///
    /// Must not modify `source_dir` in any way.
    fn compress(&self, source_dir: &Path, archive_path: &Path) -> Result<()>;

    /// Unpack `archive_path` into `target_dir`, overwriting on conflict.
    ///
    /// Must not delete `archive_path`.
    fn extract(&self, archive_path: &Path, target_dir: &Path) -> Result<()>;

    /// Archive filename suffix (without the dot) this tool produces and
    /// recognizes. Drives both sibling-archive naming and the restore scan.
    fn extension(&self) -> &str;
}

/// [`ArchiveTool`] backed by the `7z` command-line binary.
pub struct SevenZip {
    program: String,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl Default for SevenZip {
    fn default() -> Self {
        Self::new()
    }
}

impl SevenZip {
    pub fn new() -> Self {
        Self::with_program("7z")
    }

    /// Use a different binary name, e.g. `7za` or `7zz`.
    pub fn with_program(program: impl Into<String>) -> Self {
        SevenZip {
            program: program.into(),
            timeout: None,
            cancel: CancelToken::new(),
        }
    }

    /// Kill the child and fail with [`OrganizerError::Timeout`] if a single
    /// invocation runs longer than `timeout`. No timeout by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share a cancellation token with the caller.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Spawn the tool and wait for it, honoring cancellation and timeout.
    /// `subject` is the directory or archive the invocation is about, used
    /// for error reporting only.
    fn run(&self, mut cmd: Command, subject: &Path) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(OrganizerError::Cancelled {
                path: subject.to_path_buf(),
            });
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrganizerError::ToolMissing {
                    program: self.program.clone(),
                }
            } else {
                OrganizerError::io(e, subject)
            }
        })?;

        // Drain stderr on its own thread while we poll for exit. A child
        // that fills the pipe buffer would otherwise block on write and
        // never exit, stalling the poll loop below.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(|e| OrganizerError::io(e, subject))? {
                Some(status) => break status,
                None => {
                    if self.cancel.is_cancelled() {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(OrganizerError::Cancelled {
                            path: subject.to_path_buf(),
                        });
                    }
                    if let Some(limit) = self.timeout {
                        if started.elapsed() > limit {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(OrganizerError::Timeout {
                                program: self.program.clone(),
                                path: subject.to_path_buf(),
                                secs: limit.as_secs(),
                            });
                        }
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        if status.success() {
            return Ok(());
        }

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Err(OrganizerError::ToolFailed {
            program: self.program.clone(),
            path: subject.to_path_buf(),
            code: status.code(),
            stderr: stderr.trim().to_string(),
        })
    }
}

impl ArchiveTool for SevenZip {
    fn compress(&self, source_dir: &Path, archive_path: &Path) -> Result<()> {
        let parent = source_dir.parent().unwrap_or_else(|| Path::new("."));
        let name = source_dir
            .file_name()
            .ok_or_else(|| OrganizerError::InvalidPath {
                path: source_dir.to_path_buf(),
            })?;

        // The child runs with cwd = parent so the archive stores only the
        // relative directory name; the archive path must stay valid there.
        let archive_abs = absolutize(archive_path)?;

        debug!(source = %source_dir.display(), archive = %archive_abs.display(), "compressing");

        let mut cmd = Command::new(&self.program);
        cmd.arg("a")
            .arg("-t7z")
            .arg("-mx=9")
            .arg("-m0=LZMA2")
            .arg("-mmt=on")
            .arg("-spf")
            .arg(&archive_abs)
            .arg(name)
            .current_dir(parent);
        self.run(cmd, source_dir)
    }

    fn extract(&self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        debug!(archive = %archive_path.display(), target = %target_dir.display(), "extracting");

        let mut cmd = Command::new(&self.program);
        cmd.arg("x")
            .arg(format!("-o{}", target_dir.display()))
            .arg("-y")
            .arg(archive_path);
        self.run(cmd, archive_path)
    }

    fn extension(&self) -> &str {
        "7z"
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(|e| OrganizerError::io(e, path))?;
        Ok(cwd.join(path))
    }
}
