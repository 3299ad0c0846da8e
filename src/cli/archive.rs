//! Archive command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{default_worktree_cache_dir, parse_globs, repo_name};
use crate::gitcli::ArchiveOptions;
use crate::repo::{GitRepo, LocalRepo};

#[derive(Args)]
pub struct ArchiveArgs {
    /// Local repository path
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit to archive (defaults to HEAD)
    #[arg(short, long, value_name = "HASH")]
    pub commit: Option<String>,

    /// Restrict the archive to this subtree
    #[arg(long, value_name = "PATH")]
    pub base_path: Option<String>,

    /// Include globs (comma-separated, repeatable)
    #[arg(short = 'i', long = "include", value_name = "GLOBS")]
    pub include: Vec<String>,

    /// Exclude globs (comma-separated, repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "GLOBS")]
    pub exclude: Vec<String>,

    /// Where to write the tar stream
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Worktree cache directory (used when the commit has submodules)
    #[arg(long, value_name = "DIR")]
    pub worktree_cache: Option<PathBuf>,
}

pub fn run(args: ArchiveArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed resolving repository path: {}", args.path.display()))?;

    let cache_dir = args.worktree_cache.unwrap_or_else(default_worktree_cache_dir);
    let repo = LocalRepo::open(repo_name(&root), &root, cache_dir)?;

    let commit = match args.commit {
        Some(commit) => commit,
        None => repo.head_commit()?,
    };

    let opts = ArchiveOptions {
        commit,
        base_path: args.base_path.unwrap_or_default(),
        include_globs: parse_globs(&args.include),
        exclude_globs: parse_globs(&args.exclude),
    };

    let descriptor = repo.create_archive(&args.output, &opts)?;
    println!("Archive of {} written to {}", descriptor.commit, descriptor.file_path.display());

    Ok(())
}
