//! Command-line interface for repo-digest
//!
//! Provides checksum, repository info, commit search, patch and archive
//! subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod archive;
mod checksum;
mod find_commit;
mod info;
mod patch;
mod utils;

/// Deterministic checksums of filtered Git worktree snapshots
#[derive(Parser)]
#[command(name = "repo-digest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the checksum of a filtered snapshot at a commit
    Checksum(checksum::ChecksumArgs),

    /// Display repository information
    Info(info::InfoArgs),

    /// Find the first ancestor commit whose message matches a regex
    FindCommit(find_commit::FindCommitArgs),

    /// Write a patch between two commits, honoring the path filter
    Patch(patch::PatchArgs),

    /// Write a tar archive of a commit, honoring the path filter
    Archive(archive::ArchiveArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Checksum(args) => checksum::run(args),
        Commands::Info(args) => info::run(args),
        Commands::FindCommit(args) => find_commit::run(args),
        Commands::Patch(args) => patch::run(args),
        Commands::Archive(args) => archive::run(args),
    }
}
