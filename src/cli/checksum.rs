//! Checksum command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::json;

use super::utils::{default_worktree_cache_dir, parse_globs, repo_name};
use crate::checksum::ChecksumOptions;
use crate::config::load_config;
use crate::repo::{GitRepo, LocalRepo};

#[derive(Args)]
pub struct ChecksumArgs {
    /// Local repository path
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit to snapshot (defaults to HEAD)
    #[arg(short, long, value_name = "HASH")]
    pub commit: Option<String>,

    /// Restrict traversal to this subtree
    #[arg(long, value_name = "PATH")]
    pub base_path: Option<String>,

    /// Include globs (comma-separated, repeatable)
    #[arg(short = 'i', long = "include", value_name = "GLOBS")]
    pub include: Vec<String>,

    /// Exclude globs (comma-separated, repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "GLOBS")]
    pub exclude: Vec<String>,

    /// Path patterns to select; patterns matching nothing are reported
    #[arg(value_name = "PATTERN")]
    pub paths: Vec<String>,

    /// Traversal strategy
    #[arg(long, value_enum, default_value = "worktree")]
    pub strategy: Strategy,

    /// Worktree cache directory
    #[arg(long, value_name = "DIR")]
    pub worktree_cache: Option<PathBuf>,

    /// Config file (default: repo-digest.toml at the repository root)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Materialize the worktree and hash file content, modes and symlinks
    Worktree,
    /// Walk tree objects and hash object ids, pruning unfiltered subtrees
    Tree,
}

pub fn run(args: ChecksumArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed resolving repository path: {}", args.path.display()))?;

    let config = load_config(&root, args.config.as_deref())?;

    let cache_dir = args
        .worktree_cache
        .or(config.worktree_cache_dir)
        .unwrap_or_else(default_worktree_cache_dir);

    let repo = LocalRepo::open(repo_name(&root), &root, &cache_dir)?;

    let commit = match args.commit {
        Some(commit) => commit,
        None => repo.head_commit().context("Failed resolving HEAD; pass --commit explicitly")?,
    };

    let include = parse_globs(&args.include);
    let exclude = parse_globs(&args.exclude);

    let opts = ChecksumOptions {
        commit: commit.clone(),
        base_path: args.base_path.or(config.base_path).unwrap_or_default(),
        include_globs: if include.is_empty() { config.include_globs } else { include },
        exclude_globs: if exclude.is_empty() { config.exclude_globs } else { exclude },
        paths: args.paths,
    };

    let checksum = match args.strategy {
        Strategy::Worktree => repo.checksum(&opts)?,
        Strategy::Tree => repo.checksum_from_tree(&opts)?,
    };

    if args.json {
        let strategy = match args.strategy {
            Strategy::Worktree => "worktree",
            Strategy::Tree => "tree",
        };
        let report = json!({
            "commit": commit,
            "strategy": strategy,
            "digest": checksum.digest,
            "no_match_paths": checksum.no_match_paths,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for pattern in &checksum.no_match_paths {
            eprintln!("Note: path pattern '{pattern}' matched no files");
        }
        println!("{}", checksum.digest);
    }

    Ok(())
}
