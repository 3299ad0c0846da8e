//! Configuration loading
//!
//! Defaults for the checksum filter and the worktree cache can live in a
//! `repo-digest.toml` at the repository root; CLI flags take precedence.

use std::path::PathBuf;

use serde::Deserialize;

pub mod loader;

pub use loader::load_config;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path prefix restricting checksums to one subtree.
    pub base_path: Option<String>,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    /// Where materialized worktrees are cached between invocations.
    pub worktree_cache_dir: Option<PathBuf>,
}
