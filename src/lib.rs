//! # dft-organizer Core Library
//!
//! Archives large trees of completed scientific-calculation directories
//! into per-directory `7z` archives (bottom-up, never deleting a directory
//! before its archive is verified) and restores them by extracting nested
//! archives level by level until none remain.
//!
//! ## Key Modules
//!
//! - [`sevenzip`]: the [`ArchiveTool`](sevenzip::ArchiveTool) boundary and
//!   its `7z` subprocess implementation.
//! - [`walker`]: bottom-up directory enumeration and the per-round archive
//!   scan.
//! - [`archive`]: the compress-and-remove pipeline.
//! - [`restore`]: the iterative fixed-point extraction pipeline.
//! - [`report`]: engine classification, error maps and CSV summaries.

pub mod archive;
pub mod cli;
pub mod error;
pub mod report;
pub mod restore;
pub mod sevenzip;
pub mod walker;

pub use error::{OrganizerError, Result};
