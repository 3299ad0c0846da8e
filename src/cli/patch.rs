//! Patch command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{default_worktree_cache_dir, parse_globs, repo_name};
use crate::gitcli::PatchOptions;
use crate::repo::{GitRepo, LocalRepo};

#[derive(Args)]
pub struct PatchArgs {
    /// Local repository path
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit the patch starts from
    #[arg(long, value_name = "HASH")]
    pub from: String,

    /// Commit the patch ends at
    #[arg(long, value_name = "HASH")]
    pub to: String,

    /// Restrict the patch to this subtree
    #[arg(long, value_name = "PATH")]
    pub base_path: Option<String>,

    /// Include globs (comma-separated, repeatable)
    #[arg(short = 'i', long = "include", value_name = "GLOBS")]
    pub include: Vec<String>,

    /// Exclude globs (comma-separated, repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "GLOBS")]
    pub exclude: Vec<String>,

    /// Emit whole-function hunk context
    #[arg(short = 'W', long)]
    pub entire_file_context: bool,

    /// Emit binary deltas
    #[arg(long)]
    pub binary: bool,

    /// Where to write the patch
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Worktree cache directory (used when the target commit has submodules)
    #[arg(long, value_name = "DIR")]
    pub worktree_cache: Option<PathBuf>,
}

pub fn run(args: PatchArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed resolving repository path: {}", args.path.display()))?;

    let cache_dir = args.worktree_cache.unwrap_or_else(default_worktree_cache_dir);
    let repo = LocalRepo::open(repo_name(&root), &root, cache_dir)?;

    let opts = PatchOptions {
        from_commit: args.from,
        to_commit: args.to,
        base_path: args.base_path.unwrap_or_default(),
        include_globs: parse_globs(&args.include),
        exclude_globs: parse_globs(&args.exclude),
        with_entire_file_context: args.entire_file_context,
        with_binary: args.binary,
    };

    let descriptor = repo.create_patch(&args.output, &opts)?;
    println!(
        "Patch {}..{} written to {}",
        descriptor.from_commit,
        descriptor.to_commit,
        descriptor.file_path.display()
    );

    Ok(())
}
