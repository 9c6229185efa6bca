use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// The primary error type for all operations in the `dft_organizer` crate.
#[derive(Debug, Error)]
pub enum OrganizerError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The external archiver binary could not be found on `PATH`.
    #[error("archiver binary '{program}' not found on PATH")]
    ToolMissing { program: String },

    /// The external archiver ran but reported failure for the given path.
    #[error("'{program}' failed on '{}' (exit code {code:?}): {stderr}", .path.display())]
    ToolFailed {
        program: String,
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// A tool invocation was aborted through a [`CancelToken`](crate::sevenzip::CancelToken).
    /// The directory or archive in flight is left untouched.
    #[error("operation on '{}' was cancelled", .path.display())]
    Cancelled { path: PathBuf },

    /// A tool invocation exceeded its configured timeout and was killed.
    #[error("'{program}' timed out after {secs}s on '{}'", .path.display())]
    Timeout {
        program: String,
        path: PathBuf,
        secs: u64,
    },

    /// The given path exists but is not a directory (or does not exist at all).
    #[error("not a directory: '{}'", .path.display())]
    NotADirectory { path: PathBuf },

    /// A path without a parent or final component where one is required,
    /// e.g. when deriving the sibling archive name for a directory.
    #[error("cannot derive an archive name for '{}'", .path.display())]
    InvalidPath { path: PathBuf },

    /// The tool reported a successful extraction but the directory the
    /// archive should have produced does not exist.
    #[error("extracted directory not found: '{}'", .path.display())]
    MissingExtractedDir { path: PathBuf },

    /// A malformed AiiDA UUID: at least the two shard components are
    /// needed to locate a calculation.
    #[error("UUID too short: '{uuid}'")]
    UuidTooShort { uuid: String },

    /// No calculation directory matching the UUID exists under the root.
    #[error("calculation with UUID '{uuid}' not found under '{}'", .root.display())]
    CalculationNotFound { uuid: String, root: PathBuf },

    /// An error while writing the summary CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The bounded worker pool could not be constructed.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl OrganizerError {
    /// Attach a path to a raw `io::Error`.
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        OrganizerError::Io {
            source,
            path: path.into(),
        }
    }
}
