//! Commit-message search command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{default_worktree_cache_dir, repo_name};
use crate::repo::{GitRepo, LocalRepo};

#[derive(Args)]
pub struct FindCommitArgs {
    /// Regex to match against commit messages
    #[arg(value_name = "REGEX")]
    pub pattern: String,

    /// Local repository path
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit to start the ancestor search from (defaults to HEAD)
    #[arg(long, value_name = "HASH")]
    pub from: Option<String>,
}

pub fn run(args: FindCommitArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed resolving repository path: {}", args.path.display()))?;

    let repo = LocalRepo::open(repo_name(&root), &root, default_worktree_cache_dir())?;

    let from = match args.from {
        Some(commit) => commit,
        None => repo.head_commit()?,
    };

    match repo.find_commit_by_message(&from, &args.pattern)? {
        Some(commit) => {
            println!("{commit}");
            Ok(())
        }
        None => anyhow::bail!("No commit reachable from {} matches '{}'", from, args.pattern),
    }
}
