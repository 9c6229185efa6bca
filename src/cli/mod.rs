use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Archive a calculation tree bottom-up into per-directory 7z archives and remove the originals.
    #[command(alias = "a")]
    Archive {
        /// Root directory to archive. Must exist.
        #[arg(required = true)]
        path: PathBuf,

        /// Skip the summary/error reports normally generated before archiving.
        #[arg(long = "no-report", action = clap::ArgAction::SetFalse, default_value_t = true)]
        report: bool,

        /// AiiDA mode: derive calculation UUIDs from the path structure.
        #[arg(long)]
        aiida: bool,

        /// Number of parallel workers for sibling directories. [0 = auto-detect based on CPU cores]
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },

    /// Restore a 7z archive, or a directory containing nested archives, to a plain tree.
    #[command(alias = "x")]
    Restore {
        /// A .7z archive file or a directory possibly containing nested archives.
        #[arg(required = true)]
        path: PathBuf,

        /// Skip the summary/error reports normally generated after extraction.
        #[arg(long = "no-report", action = clap::ArgAction::SetFalse, default_value_t = true)]
        report: bool,

        /// AiiDA mode: derive calculation UUIDs from the path structure.
        #[arg(long)]
        aiida: bool,

        /// Number of parallel workers for archives within one round. [0 = auto-detect based on CPU cores]
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },

    /// Generate summary and error reports for an already-restored tree without archiving anything.
    #[command(alias = "r")]
    Report {
        /// Root directory containing restored calculations.
        #[arg(required = true)]
        path: PathBuf,

        /// AiiDA mode: derive calculation UUIDs from the path structure.
        #[arg(long)]
        aiida: bool,

        /// Report on a single calculation, located by its AiiDA UUID
        /// (e.g. 0ea8a6be-7199-4c3e-9263-fae76e8d081e; dashes are ignored).
        #[arg(long)]
        uuid: Option<String>,
    },
}

/// Parses command-line arguments using `clap` and returns the command to execute.
pub fn run() -> Result<Commands, Box<dyn std::error::Error>> {
    let args = Args::parse();
    Ok(args.command)
}
