//! repo-digest: deterministic checksums of filtered Git worktree snapshots
//!
//! Computes content-addressed checksums of a filtered subset of a Git
//! repository at a specific commit, so build and caching pipelines can decide
//! whether previously produced artifacts are still valid for a source
//! snapshot.

use anyhow::Result;

mod checksum;
mod cli;
mod config;
mod error;
mod filter;
mod gitcli;
mod repo;
#[cfg(test)]
mod testutil;

fn main() -> Result<()> {
    cli::run()
}
