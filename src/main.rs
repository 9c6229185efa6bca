//! Main entry point for the dft-organizer CLI app

use dft_organizer::cli::{self, Commands};
use dft_organizer::sevenzip::SevenZip;
use dft_organizer::{archive, report, restore};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run_app() {
        Ok(true) => std::process::ExitCode::SUCCESS,
        // Completed, but some directories or archives failed.
        Ok(false) => std::process::ExitCode::FAILURE,
        Err(e) => {
            if e.downcast_ref::<clap::Error>().is_none() {
                eprintln!("Error: {}", e);
            }
            std::process::ExitCode::FAILURE
        }
    }
}

fn run_app() -> Result<bool, Box<dyn std::error::Error>> {
    let command = cli::run()?;

    match command {
        Commands::Archive {
            path,
            report,
            aiida,
            threads,
        } => {
            let tool = SevenZip::new();
            let opts = archive::ArchiveOptions {
                make_report: report,
                aiida,
                threads,
            };
            let outcome = archive::archive_and_remove(&path, &tool, &opts)?;
            for (dir, why) in &outcome.failed {
                eprintln!("failed to archive {}: {}", dir.display(), why);
            }
            println!(
                "archived {} directories, skipped {} empty, {} failed",
                outcome.archived.len(),
                outcome.skipped_empty.len(),
                outcome.failed.len()
            );
            Ok(outcome.is_success())
        }
        Commands::Restore {
            path,
            report,
            aiida,
            threads,
        } => {
            let tool = SevenZip::new();
            let opts = restore::RestoreOptions {
                make_report: report,
                aiida,
                threads,
            };
            let outcome = restore::restore(&path, &tool, &opts)?;
            for (archive, why) in &outcome.failed {
                eprintln!("failed to extract {}: {}", archive.display(), why);
            }
            println!(
                "extracted {} archives in {} rounds, {} failed, restored tree at {}",
                outcome.extracted.len(),
                outcome.rounds,
                outcome.failed.len(),
                outcome.root.display()
            );
            Ok(outcome.is_success())
        }
        Commands::Report { path, aiida, uuid } => {
            let written = match uuid {
                Some(uuid) => report::generate_report_for_uuid(&path, &uuid.replace('-', ""))?,
                None => report::generate_reports_only(&path, aiida)?,
            };
            for file in &written {
                println!("wrote {}", file.display());
            }
            Ok(true)
        }
    }
}
