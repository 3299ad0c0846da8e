//! Info command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use super::utils::{default_worktree_cache_dir, repo_name};
use crate::error::DigestError;
use crate::repo::{GitRepo, LocalRepo};

#[derive(Args)]
pub struct InfoArgs {
    /// Local repository path
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Emit machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed resolving repository path: {}", args.path.display()))?;

    let repo = LocalRepo::open(repo_name(&root), &root, default_worktree_cache_dir())?;

    let empty = repo.is_empty()?;
    let head_commit = if empty { None } else { Some(repo.head_commit()?) };
    let head_branch = if empty {
        None
    } else {
        match repo.head_branch_name() {
            Ok(branch) => Some(branch),
            Err(DigestError::NotABranch) => None,
            Err(e) => return Err(e.into()),
        }
    };
    let origin_url = repo.remote_origin_url()?;
    let tags = repo.tags_list()?;
    let remote_branches = repo.remote_branches_list()?;

    if args.json {
        let report = json!({
            "name": repo.name(),
            "empty": empty,
            "head_commit": head_commit,
            "head_branch": head_branch,
            "origin_url": origin_url,
            "tags": tags,
            "remote_branches": remote_branches,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Repository: {}", repo.name());
    if empty {
        println!("State: empty (no commits)");
    } else {
        println!("Head commit: {}", head_commit.as_deref().unwrap_or_default());
        match head_branch {
            Some(branch) => println!("Head branch: {branch}"),
            None => println!("Head branch: (detached)"),
        }
    }
    println!("Origin URL: {}", origin_url.as_deref().unwrap_or("(none)"));

    if !tags.is_empty() {
        println!("Tags:");
        for tag in &tags {
            println!("  {tag}");
        }
    }

    if !remote_branches.is_empty() {
        println!("Remote branches:");
        for branch in &remote_branches {
            println!("  {branch}");
        }
    }

    Ok(())
}
